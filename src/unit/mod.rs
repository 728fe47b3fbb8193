//! Units: registry seam, attributes, and timed buffs

pub mod buffs;
pub mod roster;

pub use buffs::{BuffEffect, BuffEntry, BuffLedger};
pub use roster::{Attributes, InteractionLayer, Roster, Squad};
