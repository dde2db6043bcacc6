//Error kinds observable in the solver core.
//
//Fatal kinds abort the run (the caller flushes mass-balance output and
//exits non-zero); warnings are reported and the tick continues.

#[derive(Debug)]
#[derive(Clone)]
#[derive(PartialEq)]
pub enum ErrorKind {
    //water depth update produced a negative result beyond tolerance (fatal)
    NegativeDepth,
    //concentration integrator produced negative new mass (warning, clamped)
    NegativeConcentration,
    //maximum Courant number exceeded 1 (advisory, for time-step control)
    CourantExceeded,
    //up/down direction tables are not mutual, or link counts disagree (fatal at init)
    TopologyInconsistency,
    //unknown option value, negative geometry, bad stack size (fatal at init)
    ConfigurationError,
}

//Location-tagged simulation error. For overland cells the pair is
//(row, col); for channel nodes it is (link, node). The solids index is
//zero for water errors.
#[derive(Debug)]
#[derive(Clone)]
pub struct SimulationError {
    pub kind: ErrorKind,
    pub i: usize,
    pub j: usize,
    pub solid: usize,
    pub detail: String,
}

impl SimulationError {
    pub fn new(kind: ErrorKind, i: usize, j: usize, solid: usize, detail: &str) -> SimulationError {
        SimulationError {
            kind,
            i,
            j,
            solid,
            detail: detail.to_string(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        match self.kind {
            ErrorKind::NegativeDepth => true,
            ErrorKind::TopologyInconsistency => true,
            ErrorKind::ConfigurationError => true,
            ErrorKind::NegativeConcentration => false,
            ErrorKind::CourantExceeded => false,
        }
    }
}

impl std::fmt::Display for SimulationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let kind = match self.kind {
            ErrorKind::NegativeDepth => "negative water depth",
            ErrorKind::NegativeConcentration => "negative concentration",
            ErrorKind::CourantExceeded => "Courant number exceeded",
            ErrorKind::TopologyInconsistency => "topology inconsistency",
            ErrorKind::ConfigurationError => "configuration error",
        };
        write!(
            f,
            "{} at ({}, {}) solid {}: {}",
            kind, self.i, self.j, self.solid, self.detail
        )
    }
}

impl From<SimulationError> for String {
    fn from(error: SimulationError) -> Self {
        format!("{}", error)
    }
}
