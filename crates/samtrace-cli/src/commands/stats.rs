//! The stats command: evaluate a statistic from the command line.

use samtrace_stats::{
    binomial_test, clopper_pearson_ci, cohens_h, significance_level, EffectMagnitude,
};

use crate::cli::{StatsArgs, Statistic};
use crate::error::{CliError, Result};
use crate::output::Formatter;

/// Execute the stats command.
pub fn execute_stats(args: &StatsArgs, formatter: &Formatter) -> Result<()> {
    let output = match &args.statistic {
        Statistic::Binomial { count1, count2 } => {
            let test = binomial_test(*count1, *count2);
            let level = significance_level(test.p_value);
            formatter.format_binomial(&test, level)?
        }
        Statistic::CohensH { p1, p2 } => {
            for (name, p) in [("p1", *p1), ("p2", *p2)] {
                if !(0.0..=1.0).contains(&p) {
                    return Err(CliError::InvalidInput(format!(
                        "{} must be in [0, 1], got {}",
                        name, p
                    )));
                }
            }
            let h = cohens_h(*p1, *p2);
            formatter.format_effect(h, EffectMagnitude::classify(h))?
        }
        Statistic::Ci {
            successes,
            trials,
            level,
        } => {
            if !(0.0..1.0).contains(level) || *level <= 0.0 {
                return Err(CliError::InvalidInput(format!(
                    "confidence level must be in (0, 1), got {}",
                    level
                )));
            }
            if successes > trials {
                return Err(CliError::InvalidInput(format!(
                    "successes ({}) exceed trials ({})",
                    successes, trials
                )));
            }
            let interval = clopper_pearson_ci(*successes, *trials, *level);
            formatter.format_interval(&interval, *level)?
        }
    };
    println!("{}", output);
    Ok(())
}
