use thiserror::Error;

/// Errors raised while deriving ranging statistics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Division by zero: {0}")]
    DivisionByZero(&'static str),

    #[error("Insufficient samples: {required} required, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    #[error("Non-positive {counter} counter: {value}")]
    NonPositiveCounter { counter: &'static str, value: f64 },

    #[error("Stats table construction failed at {distance}m ({}): {source}", describe_trial(.trial))]
    AtDistance {
        distance: u32,
        trial: Option<u32>,
        #[source]
        source: Box<StatsError>,
    },
}

impl StatsError {
    /// Wrap a per-distance failure with the distance and trial it came from.
    pub fn at_distance(distance: u32, trial: Option<u32>, source: StatsError) -> Self {
        StatsError::AtDistance {
            distance,
            trial,
            source: Box::new(source),
        }
    }

    /// The innermost reason, unwrapping any distance context.
    pub fn reason(&self) -> &StatsError {
        match self {
            StatsError::AtDistance { source, .. } => source.reason(),
            other => other,
        }
    }
}

fn describe_trial(trial: &Option<u32>) -> String {
    match trial {
        Some(index) => format!("trial {}", index),
        None => "single run".to_string(),
    }
}
