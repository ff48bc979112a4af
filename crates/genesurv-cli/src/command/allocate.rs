use anyhow::Context;
use clap::Args;
use genesurv_analysis::{
    config::{ControlMode, Direction},
    group::allocate_group,
};

#[derive(Debug, Clone, Args)]
pub(crate) struct AllocateArg {
    /// Percentile threshold in [0, 1]
    #[arg(long)]
    pub threshold: f64,

    /// Which side of the threshold forms the test group (above or below)
    #[arg(long, default_value = "above")]
    pub direction: Direction,

    /// How the control group is formed (mirrored or complement)
    #[arg(long, default_value = "complement")]
    pub control: ControlMode,

    /// Percentile ranks to label
    #[arg(required = true, num_args = 1..)]
    pub percentiles: Vec<f64>,
}

pub(crate) fn run(arg: &AllocateArg) -> anyhow::Result<()> {
    let percentiles = arg.percentiles.iter().copied().map(Some).collect::<Vec<_>>();
    let labels = allocate_group(&percentiles, arg.threshold, arg.direction, arg.control)
        .with_context(|| {
            format!(
                "Threshold {} ({}, {}) cannot be applied",
                arg.threshold, arg.direction, arg.control
            )
        })?;

    for (percentile, label) in arg.percentiles.iter().zip(labels) {
        println!("{percentile}\t{label}");
    }
    Ok(())
}
