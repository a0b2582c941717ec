pub use self::{calibration::*, maf::*, merge::*, ratio_sumstats::*};

mod calibration;
mod maf;
mod merge;
mod ratio_sumstats;
