use ferrum_cem::env::CartPole;
use ferrum_cem::metrics::TracingTabular;
use ferrum_cem::plot::RolloutPlotter;
use ferrum_cem::policy::LinearPolicy;
use ferrum_cem::snapshot::{JsonSnapshotter, SnapshotMode};
use ferrum_cem::{Cem, CemConfig};
use tracing_subscriber::EnvFilter;

const SEED: u64 = 0;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = CemConfig::default()
        .with_n_itr(20)
        .with_max_path_length(200)
        .with_n_samples(40)
        .with_best_frac(0.2)
        .with_extra_std(0.5, 10)
        .with_plot(true)
        .with_workers(4)
        .with_seed(SEED);

    let snapshot_dir = std::env::temp_dir().join("ferrum-cem-cartpole");
    let policy = LinearPolicy::new(CartPole::OBS_DIM, CartPole::N_ACTIONS);
    let mut cem = Cem::new(config, CartPole::seeded_sequence(SEED), policy)?
        .with_tabular(TracingTabular::new())
        .with_snapshotter(JsonSnapshotter::new(&snapshot_dir, SnapshotMode::Last)?)
        .with_plotter(RolloutPlotter::new());

    tracing::info!(workers = cem.num_workers(), n_best = cem.n_best(), "starting CEM on cartpole");
    let stats = cem.train().await?;

    println!("iterations:        {}", stats.iterations);
    println!("trajectories:      {}", stats.total_trajectories);
    println!("env steps:         {}", stats.total_env_steps);
    println!("best return:       {}", stats.best_undiscounted_return);
    println!("training time:     {:.2?}", stats.training_time);
    println!("snapshot:          {}", snapshot_dir.join("params.json").display());
    Ok(())
}
