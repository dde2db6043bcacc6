//Process option selectors consumed by the solver core.
//
//Each selector is an integer flag read from the model file. The numeric
//values follow the conventions of similar watershed codes:
//
//  erosion options:     0 = off, 1 = capacity-limited, >=2 = excess shear
//  deposition options:  0 = off, 1 = settling with p = 1, >=2 = probabilistic
//  fldopt:              0 = overland-to-channel only, >=1 = bidirectional

#[derive(Debug)]
#[derive(Clone)]
pub struct ProcessOptions {
    pub chnopt: i32,    //channels on/off
    pub fldopt: i32,    //floodplain transfer directionality
    pub ctlopt: i32,    //channel transmission loss on/off
    pub snowopt: i32,   //snowfall terms in the water balance
    pub meltopt: i32,   //snowmelt terms (reserved; melt is an external process)

    pub advovopt: i32,  //overland solids advection
    pub dspovopt: i32,  //overland solids dispersion
    pub depovopt: i32,  //overland solids deposition
    pub ersovopt: i32,  //overland solids erosion

    pub advchopt: i32,  //channel solids advection
    pub dspchopt: i32,  //channel solids dispersion
    pub depchopt: i32,  //channel solids deposition
    pub erschopt: i32,  //channel solids erosion

    //Process scale factors (applied to the raw process flows)
    pub advovscale: f64,
    pub advchscale: f64,
    pub depovscale: f64,
    pub depchscale: f64,
    pub ersovscale: f64,
    pub erschscale: f64,

    //Dispersion coefficients (m2/s)
    pub dspovcoeff: f64,
    pub dspchcoeff: f64,

    //Maximum number of layers a bed/soil stack may grow to
    pub nstack_max: usize,
}

impl Default for ProcessOptions {
    fn default() -> ProcessOptions {
        ProcessOptions {
            chnopt: 1,
            fldopt: 1,
            ctlopt: 0,
            snowopt: 0,
            meltopt: 0,
            advovopt: 1,
            dspovopt: 0,
            depovopt: 1,
            ersovopt: 2,
            advchopt: 1,
            dspchopt: 0,
            depchopt: 1,
            erschopt: 2,
            advovscale: 1.0,
            advchscale: 1.0,
            depovscale: 1.0,
            depchscale: 1.0,
            ersovscale: 1.0,
            erschscale: 1.0,
            dspovcoeff: 0.0,
            dspchcoeff: 0.0,
            nstack_max: 10,
        }
    }
}

impl ProcessOptions {
    pub fn new() -> ProcessOptions {
        ProcessOptions {
            ..Default::default()
        }
    }

    //Sanity-check the selector values that have hard limits.
    pub fn validate(&self) -> Result<(), String> {
        if self.nstack_max < 1 {
            return Err("nstack_max must be at least 1".to_string());
        }
        for (name, value) in [
            ("fldopt", self.fldopt),
            ("ctlopt", self.ctlopt),
            ("chnopt", self.chnopt),
            ("snowopt", self.snowopt),
            ("depovopt", self.depovopt),
            ("depchopt", self.depchopt),
            ("ersovopt", self.ersovopt),
            ("erschopt", self.erschopt),
        ] {
            if value < 0 {
                return Err(format!("option {} must not be negative", name));
            }
        }
        Ok(())
    }
}
