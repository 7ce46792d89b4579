use anyhow::Result;
use colored::Colorize;
use mounthole_layout::{MountConfig, default_registry};

pub fn execute(config: &MountConfig) -> Result<()> {
    let registry = default_registry(config)?;
    for action in registry.iter() {
        let info = action.info();
        println!("{}", info.name.bold());
        println!("  category:    {}", info.category);
        println!("  description: {}", info.description);
    }
    Ok(())
}
