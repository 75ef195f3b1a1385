use anyhow::Result;
use deeprl::{conf::TrainTd3Config, pendulum::Pendulum};
use deeprl_candle_agent::{mlp::Mlp, td3::Td3, TensorBatch};
use deeprl_core::{
    generic_replay_buffer::{SimpleReplayBuffer, SimpleStepProcessor, SimpleStepProcessorConfig},
    record::BufferedRecorder,
    Agent, Configurable, DefaultEvaluator, Evaluator, ExperienceBufferBase, Trainer,
};
use tempdir::TempDir;

type StepProc = SimpleStepProcessor<Pendulum, TensorBatch, TensorBatch>;
type ReplayBuffer = SimpleReplayBuffer<TensorBatch, TensorBatch>;
type Td3Agent = Td3<Pendulum, Mlp, Mlp, ReplayBuffer>;

fn config() -> TrainTd3Config {
    let mut config = TrainTd3Config::default();
    config.env.num_episodes = 3;
    config.env.max_episode_steps = 30;
    config.env.checkpoint_interval = 2;
    config.td3.memory_capacity = 50;
    config.td3.batch_size = 16;
    config.td3.hidden_dims = vec![32, 32];
    config
}

#[test]
fn test_train_and_evaluate() -> Result<()> {
    let tmp = TempDir::new("td3_pendulum")?;
    let model_dir = tmp.path().to_str().unwrap();
    let config = config();

    let mut trainer = Trainer::<Pendulum, StepProc, ReplayBuffer>::build(
        config.trainer_config(Some(model_dir))?,
        config.env_config()?,
        SimpleStepProcessorConfig::default(),
    )?;
    let mut agent = Td3Agent::build(config.td3_config()?)?;
    let mut recorder = BufferedRecorder::new();
    trainer.train(&mut agent, &mut recorder)?;

    // 90 transitions in a buffer of capacity 50.
    assert_eq!(agent.buffer().len(), 50);
    assert_eq!(agent.n_opts(), 90 - 16 + 1);

    let records = recorder.iter().collect::<Vec<_>>();
    assert_eq!(records.len(), 3);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record.get_scalar("episode")?, i as f32);
        assert_eq!(record.get_scalar("episode_length")?, 30.0);
        assert!(record.get_scalar("episodic_return")? <= 0.0);
        assert!(record.get_scalar("loss_critic")?.is_finite());
        assert!(record.get_datetime("datetime").is_ok());
    }

    assert!(tmp.path().join("ep0").join("actor.safetensors").exists());
    assert!(tmp.path().join("ep2").join("critic2.safetensors").exists());
    assert!(!tmp.path().join("ep1").exists());

    let mut loaded = Td3Agent::build(config.td3_config()?)?;
    loaded.load_params(&tmp.path().join("ep2"))?;
    loaded.eval();
    let mut evaluator = DefaultEvaluator::<Pendulum>::new(&config.env_config()?, 0, 2)?;
    let record = evaluator.evaluate(&mut loaded)?;
    assert_eq!(record.get_array1("episode_returns")?.len(), 2);
    assert!(record.get_scalar("episode_return")? <= 0.0);

    Ok(())
}
