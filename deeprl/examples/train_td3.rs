use anyhow::Result;
use clap::Parser;
use deeprl::{conf::TrainTd3Config, pendulum::Pendulum};
use deeprl_candle_agent::{mlp::Mlp, td3::Td3, TensorBatch};
use deeprl_core::{
    generic_replay_buffer::{SimpleReplayBuffer, SimpleStepProcessor, SimpleStepProcessorConfig},
    record::{NullRecorder, Recorder},
    Agent, Configurable, DefaultEvaluator, Evaluator as _, Trainer,
};
use deeprl_tensorboard::TensorboardRecorder;
use log::info;
use std::path::{Path, PathBuf};

type StepProc = SimpleStepProcessor<Pendulum, TensorBatch, TensorBatch>;
type ReplayBuffer = SimpleReplayBuffer<TensorBatch, TensorBatch>;
type Td3Agent = Td3<Pendulum, Mlp, Mlp, ReplayBuffer>;

const N_EPISODES_PER_EVAL: usize = 5;

/// Train/eval TD3 agent in pendulum environment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "deeprl/examples/conf/train_td3.yaml")]
    config: String,

    /// Train TD3 agent, not evaluate
    #[arg(short, long, default_value_t = false)]
    train: bool,

    /// Evaluate TD3 agent, not train
    #[arg(short, long, default_value_t = false)]
    eval: bool,

    /// Directory of checkpoints
    #[arg(short, long, default_value = "./deeprl/examples/model/td3_pendulum")]
    model_dir: String,

    /// Write episodic returns to tensorboard in the model directory
    #[arg(long, default_value_t = false)]
    tensorboard: bool,
}

fn create_recorder(model_dir: &str, tensorboard: bool) -> Box<dyn Recorder> {
    match tensorboard {
        true => Box::new(TensorboardRecorder::new(model_dir)),
        false => Box::new(NullRecorder::new()),
    }
}

fn train(config: &TrainTd3Config, model_dir: &str, tensorboard: bool) -> Result<()> {
    let mut trainer = Trainer::<Pendulum, StepProc, ReplayBuffer>::build(
        config.trainer_config(Some(model_dir))?,
        config.env_config()?,
        SimpleStepProcessorConfig::default(),
    )?;
    let mut agent = Td3Agent::build(config.td3_config()?)?;
    let mut recorder = create_recorder(model_dir, tensorboard);
    trainer.train(&mut agent, recorder.as_mut())?;

    Ok(())
}

fn eval(config: &TrainTd3Config, n_episodes: usize, model_dir: &Path) -> Result<f32> {
    let mut agent = {
        let mut agent = Td3Agent::build(config.td3_config()?)?;
        agent.load_params(model_dir)?;
        agent.eval();
        agent
    };
    let mut evaluator =
        DefaultEvaluator::<Pendulum>::new(&config.env_config()?, config.env.seed as i64, n_episodes)?;
    let record = evaluator.evaluate(&mut agent)?;
    let episode_return = record.get_scalar("episode_return")?;
    info!("Mean return over {} episodes: {:.3}", n_episodes, episode_return);

    Ok(episode_return)
}

/// Returns the checkpoint of the last saved episode.
fn last_checkpoint(config: &TrainTd3Config, model_dir: &str) -> Result<PathBuf> {
    config.env.check()?;
    let interval = config.env.checkpoint_interval;
    let last = config.env.num_episodes.saturating_sub(1) / interval * interval;
    Ok(Path::new(model_dir).join(format!("ep{}", last)))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = TrainTd3Config::load(&args.config)?;
    info!("Loaded configuration from {}", args.config);

    if args.train {
        train(&config, &args.model_dir, args.tensorboard)?;
    } else if args.eval {
        eval(&config, N_EPISODES_PER_EVAL, &last_checkpoint(&config, &args.model_dir)?)?;
    } else {
        train(&config, &args.model_dir, args.tensorboard)?;
        eval(&config, N_EPISODES_PER_EVAL, &last_checkpoint(&config, &args.model_dir)?)?;
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_td3_pendulum() -> Result<()> {
        let model_dir = TempDir::new("td3_pendulum")?;
        let model_dir = model_dir.path().to_str().unwrap();
        let mut config = TrainTd3Config::default();
        config.env.num_episodes = 2;
        config.env.max_episode_steps = 20;
        config.env.checkpoint_interval = 1;
        config.td3.batch_size = 8;
        config.td3.hidden_dims = vec![16, 16];

        train(&config, model_dir, true)?;
        eval(&config, 1, &last_checkpoint(&config, model_dir)?)?;

        Ok(())
    }

    #[test]
    fn test_last_checkpoint() -> Result<()> {
        let mut config = TrainTd3Config::default();
        config.env.num_episodes = 45;
        config.env.checkpoint_interval = 20;
        assert_eq!(last_checkpoint(&config, "model")?, Path::new("model").join("ep40"));

        config.env.checkpoint_interval = 0;
        assert!(last_checkpoint(&config, "model").is_err());
        Ok(())
    }
}
