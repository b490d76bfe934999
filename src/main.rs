use std::{env, io, num::NonZeroUsize};

use log::info;

use flowgraph::{
    Feed, Graph, Session,
    export::freeze_and_export,
    model::LinearModel,
    optimization::GradientDescent,
    training::Trainer,
};

const LEARNING_RATE: f32 = 0.01;
const TRAIN_STEPS: usize = 1000;

const X_TRAIN: [f32; 4] = [1., 2., 3., 4.];
const Y_TRAIN: [f32; 4] = [0., -1., -2., -3.];

const BINARY_GRAPH_FILE: &str = "linear_regression_graph.proto";
const TEXT_GRAPH_FILE: &str = "linear_regression.txt";

fn main() -> io::Result<()> {
    env_logger::init();

    let mut graph = Graph::new();
    let model = LinearModel::build(&mut graph, 0.3, -0.3);
    let mut session = Session::new(&graph);

    let batch = model.feed(&X_TRAIN, &Y_TRAIN);
    let steps = NonZeroUsize::new(TRAIN_STEPS).unwrap();
    let mut trainer = Trainer::new(GradientDescent::new(LEARNING_RATE), steps);

    let losses = trainer.fit(&mut session, model.loss, &batch)?;
    info!(
        "trained for {} steps, final loss {}",
        losses.len(),
        losses.last().copied().unwrap_or_default()
    );

    let output = session.run(model.prediction, &Feed::new().with(model.x, &[0.7]))?;
    println!("{}", output[0]);

    for name in graph.node_names() {
        println!("{name}");
    }

    let run_dir = env::current_dir()?;
    let frozen = freeze_and_export(
        &session,
        &["add"],
        &run_dir,
        BINARY_GRAPH_FILE,
        TEXT_GRAPH_FILE,
    )?;
    info!(
        "exported frozen graph ({} nodes) to {}",
        frozen.len(),
        run_dir.display()
    );

    Ok(())
}
