use feedforward::optimizers::{OptimizerConfig, OptimizerKind};
use feedforward::utils::{format_vector, Activation, Loss, SimpleRng};
use feedforward::{Network, Result};
use tracing::info;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format;

// Small MLP to learn XOR (educational example).
const NUM_INPUTS: usize = 2;
const NUM_HIDDEN: usize = 4;
const NUM_OUTPUTS: usize = 1;
const NUM_SAMPLES: usize = 4;
// Training hyperparameters.
const LEARNING_RATE: f32 = 0.05;
const EPOCHS: usize = 2000;

const INPUTS: [[f32; NUM_INPUTS]; NUM_SAMPLES] = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
const EXPECTED: [[f32; NUM_OUTPUTS]; NUM_SAMPLES] = [[0.0], [1.0], [1.0], [0.0]];

// 2 -> 4 -> 1, sigmoid throughout, binary cross-entropy with Adam.
fn initialize_network(rng: &mut SimpleRng) -> Result<Network> {
    let mut net = Network::new(2)?;
    net.add_layer(NUM_INPUTS, NUM_HIDDEN, Activation::Sigmoid, rng)?;
    net.add_layer(NUM_HIDDEN, NUM_OUTPUTS, Activation::Sigmoid, rng)?;
    net.setup_loss(Loss::BinaryCrossEntropy);
    net.setup_optimizer(OptimizerConfig::new(OptimizerKind::Adam, LEARNING_RATE))?;
    Ok(net)
}

// Full-batch training: gradients from all four samples, then one update.
fn train(net: &mut Network, epochs: usize) -> Result<f32> {
    let mut loss = 0.0f32;
    for epoch in 0..epochs {
        let mut total = 0.0f32;
        for (input, target) in INPUTS.iter().zip(EXPECTED.iter()) {
            net.forward(input)?;
            total += net.compute_loss(target)?;
            net.backward(input, target)?;
        }
        net.update_weights()?;
        net.zero_grads()?;

        loss = total / NUM_SAMPLES as f32;
        if (epoch + 1) % 200 == 0 {
            info!("Epoch {}, Loss: {:.6}", epoch + 1, loss);
        }
    }
    Ok(loss)
}

fn sample_report(input: &[f32], expected: &[f32], predicted: &[f32]) -> String {
    format!(
        "Input: {}, Expected Output: {}, Predicted Output: {}",
        format_vector(input, 1),
        format_vector(expected, 1),
        format_vector(predicted, 3)
    )
}

// Simple evaluation on XOR samples.
fn test(net: &mut Network) -> Result<()> {
    println!("\nTesting the trained network:");
    for (input, target) in INPUTS.iter().zip(EXPECTED.iter()) {
        let output = net.forward(input)?;
        println!("{}", sample_report(input, target, output));
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .event_format(format().with_target(false).without_time())
        .init();

    // Fixed seed for reproducibility.
    let mut rng = SimpleRng::new(42);
    let mut net = initialize_network(&mut rng)?;
    train(&mut net, EPOCHS)?;
    test(&mut net)
}
