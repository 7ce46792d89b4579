//! Named actions a host application registers and invokes on request.
//!
//! The host owns the board document and decides whether to persist it after
//! an action runs. Actions only see it through [`ActionContext`].

use crate::board::BoardDocument;
use crate::config::MountConfig;
use crate::placer::{PlacementOptions, place_holes};
use crate::table::CoordinateTable;
use anyhow::{Context, Result, bail};
use std::io::Write;
use std::path::PathBuf;

pub const MOUNT_HOLE_LAYOUT: &str = "Mount hole layout plugin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionInfo {
    pub name: String,
    pub category: String,
    pub description: String,
}

/// What the host hands an action for one invocation.
pub struct ActionContext<'a> {
    pub board: &'a mut dyn BoardDocument,
    /// Human-readable progress output.
    pub out: &'a mut dyn Write,
}

pub trait ActionPlugin {
    fn info(&self) -> ActionInfo;

    fn run(&self, ctx: &mut ActionContext<'_>) -> Result<()>;
}

#[derive(Default)]
pub struct ActionRegistry {
    actions: Vec<Box<dyn ActionPlugin>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, action: Box<dyn ActionPlugin>) -> Result<()> {
        let name = action.info().name;
        if self.get(&name).is_some() {
            bail!("an action named '{name}' is already registered");
        }
        log::debug!("Registered action '{name}'");
        self.actions.push(action);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn ActionPlugin> {
        self.actions
            .iter()
            .find(|action| action.info().name == name)
            .map(|action| action.as_ref())
    }

    /// Registered actions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn ActionPlugin> {
        self.actions.iter().map(|action| action.as_ref())
    }

    pub fn run(&self, name: &str, ctx: &mut ActionContext<'_>) -> Result<()> {
        let Some(action) = self.get(name) else {
            bail!("no action named '{name}' is registered");
        };
        action
            .run(ctx)
            .with_context(|| format!("action '{name}' failed"))
    }
}

/// Places the mounting holes from the coordinate table.
#[derive(Debug, Clone)]
pub struct MountHoleLayout {
    table_path: PathBuf,
    options: PlacementOptions,
}

impl MountHoleLayout {
    pub fn new(table_path: impl Into<PathBuf>, options: PlacementOptions) -> Self {
        Self {
            table_path: table_path.into(),
            options,
        }
    }

    pub fn from_config(config: &MountConfig) -> Self {
        Self::new(config.paths.table.clone(), config.placement_options())
    }
}

impl ActionPlugin for MountHoleLayout {
    fn info(&self) -> ActionInfo {
        ActionInfo {
            name: MOUNT_HOLE_LAYOUT.to_string(),
            category: "warning light utils".to_string(),
            description: "automatically lays out hole locations according to cad specification"
                .to_string(),
        }
    }

    fn run(&self, ctx: &mut ActionContext<'_>) -> Result<()> {
        let table = CoordinateTable::read(&self.table_path)?;
        let report = place_holes(&mut *ctx.board, &table, &self.options, &mut *ctx.out)?;

        for placement in &report.placements {
            let name = placement.reference.as_deref().unwrap_or(&placement.label);
            match placement.previous {
                Some(previous) => writeln!(
                    ctx.out,
                    "hole_{} {name}: {previous} -> {}",
                    placement.table_index, placement.position
                )?,
                None => writeln!(
                    ctx.out,
                    "hole_{} {name}: -> {}",
                    placement.table_index, placement.position
                )?,
            }
        }
        Ok(())
    }
}

/// Registry with every action this crate provides.
pub fn default_registry(config: &MountConfig) -> Result<ActionRegistry> {
    let mut registry = ActionRegistry::new();
    registry.register(Box::new(MountHoleLayout::from_config(config)))?;
    Ok(registry)
}
