mod achievements;
mod daily;
mod data;
mod helpers;
mod log;
mod profile;
mod summary;

pub(crate) use achievements::{cmd_achievements, cmd_streak};
pub(crate) use daily::{cmd_notes, cmd_water, cmd_weight};
pub(crate) use data::{cmd_export, cmd_import, cmd_reset};
pub(crate) use log::{cmd_delete, cmd_log};
pub(crate) use profile::{cmd_profile_set, cmd_profile_show};
pub(crate) use summary::{cmd_day, cmd_trend};
