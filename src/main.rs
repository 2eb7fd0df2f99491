use std::env;
use std::process;

use splearn::{FitConfig, LayerSpec, Mlp, Samples};

const TWO_BIT_INPUTS: [[f32; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
const TWO_BIT_TARGETS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 0.0], [0.0, 1.0]];

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Usage: splearn [TOPOLOGY] [EPOCHS], e.g. `splearn 4x1 2000` or `splearn 3,3`.
    let mut args = env::args().skip(1);
    let spec: LayerSpec = args.next().as_deref().unwrap_or("2x1").parse()?;
    let epochs = match args.next() {
        Some(arg) => arg.parse::<usize>()?,
        None => splearn::DEFAULT_EPOCHS,
    };

    let inputs = Samples::from_rows(&TWO_BIT_INPUTS)?;
    let targets = Samples::from_rows(&TWO_BIT_TARGETS)?;

    let mut mlp = Mlp::new(spec)?;
    let cfg = FitConfig {
        epochs,
        ..FitConfig::default()
    };
    mlp.fit_with(&inputs, &targets, &cfg)?;

    log::info!(
        "sizes={:?} train_loss={}",
        mlp.sizes().unwrap_or_default(),
        mlp.evaluate(&inputs, &targets)?
    );
    for (x, y) in TWO_BIT_INPUTS.iter().zip(mlp.predict(&inputs)?) {
        println!("x={x:?} y={y:?}");
    }

    Ok(())
}
