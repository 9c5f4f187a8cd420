use crate::support::Inventory;

pub type Ctx<'a> = microbus::CommandContext<'a, Inventory>;

pub mod inventory_release;
pub mod inventory_reserve;
