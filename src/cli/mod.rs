pub mod backfill;
pub mod run;
