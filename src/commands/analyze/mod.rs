mod output;
mod report;
mod run;

pub use run::run;
