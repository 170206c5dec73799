use crate::{
    config::{ConfigError, TunerConfig},
    repositories::best,
    services::tuning,
};

/// Validates `config` and wires a tuning service builder from it.
pub fn bootstrap_tuner(config: &TunerConfig) -> Result<tuning::ServiceBuilder, ConfigError> {
    config.validate()?;

    let best = best::Repository::new(config.best_log.clone());

    Ok(tuning::Service::builder(best)
        .with_initial(config.initial.clone())
        .with_morphology(config.morphology)
        .with_population_size(config.population_size)
        .with_generations(config.generations)
        .with_mutation_rate(config.mutation_rate)
        .with_serial_policy(config.serial_policy)
        .with_seed(config.seed))
}
