//Solids (particle) class definitions.

//Cohesion selector values: 0 = non-cohesive, 1 = cohesive.
pub const CNC_NONCOHESIVE: i32 = 0;
pub const CNC_COHESIVE: i32 = 1;

#[derive(Debug)]
#[derive(Clone)]
pub struct SolidsClass {
    pub name: String,
    pub spgravity: f64,     //specific gravity (-)
    pub diameter: f64,      //representative particle diameter (m)
    pub ws: f64,            //settling velocity (m/s)
    pub tau_ce: f64,        //critical shear stress for erosion (N/m2)
    pub tau_cd: f64,        //critical shear stress for deposition (N/m2)
    pub zage: f64,          //aging factor in the excess-shear relation (-)
    pub cncopt: i32,        //cohesion selector (CNC_NONCOHESIVE / CNC_COHESIVE)
}

impl SolidsClass {
    pub fn new(name: &str) -> SolidsClass {
        SolidsClass {
            name: name.to_string(),
            spgravity: 2.65,
            diameter: 0.0001,
            ws: 0.0001,
            tau_ce: 0.1,
            tau_cd: 0.1,
            zage: 1.0,
            cncopt: CNC_NONCOHESIVE,
        }
    }

    //Bulk density of this solids type packed at the given porosity (kg/m3)
    pub fn bulk_density(&self, porosity: f64) -> f64 {
        self.spgravity * crate::constants::DENSITY_W * (1.0 - porosity)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.spgravity <= 0.0 || self.diameter <= 0.0 || self.ws < 0.0 {
            return Err(format!("solids class {} has non-physical parameters", self.name));
        }
        if self.cncopt != CNC_NONCOHESIVE && self.cncopt != CNC_COHESIVE {
            return Err(format!("solids class {} has unknown cncopt {}", self.name, self.cncopt));
        }
        if self.zage <= 0.0 {
            return Err(format!("solids class {} has non-positive zage", self.name));
        }
        Ok(())
    }
}
