//! cvm config - Show the effective configuration

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{emit_robot, robot_ok};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Print the effective configuration (default)
    #[arg(long)]
    pub show: bool,

    /// Print only the project config file path
    #[arg(long, conflicts_with = "show")]
    pub path: bool,
}

pub fn run(ctx: &AppContext, args: &ConfigArgs) -> Result<()> {
    if args.path {
        if ctx.robot_mode {
            return emit_robot(&robot_ok(serde_json::json!({
                "config_path": ctx.config_path,
                "exists": ctx.config_path.exists(),
            })));
        }
        println!("{}", ctx.config_path.display());
        return Ok(());
    }

    if ctx.robot_mode {
        return emit_robot(&robot_ok(serde_json::json!({
            "config_path": ctx.config_path,
            "root": ctx.root,
            "config": ctx.config,
        })));
    }

    println!("# {}", ctx.config_path.display());
    println!("{}", ctx.config.to_toml()?);
    Ok(())
}
