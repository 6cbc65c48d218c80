use crate::config::{PipelineConfig, WarehouseConfig};
use crate::error::Result;

/// Run the whole chain locally. Each stage is gated on the success of its
/// predecessor; an external scheduler would invoke the four subcommands with
/// the same dependency order instead.
pub fn run(pipeline: &PipelineConfig, warehouse: &WarehouseConfig) -> Result<()> {
    println!("[1/4] extract");
    super::extract::run(pipeline)?;
    println!("[2/4] clean");
    super::clean::run(pipeline)?;
    println!("[3/4] validate");
    super::validate::run(pipeline)?;
    println!("[4/4] load");
    super::load::run(pipeline, warehouse)?;
    Ok(())
}
