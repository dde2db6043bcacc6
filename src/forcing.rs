//Forcing time functions and their registries.
//
//A time function is an ordered set of (time, value) pairs evaluated by
//piecewise-linear interpolation. Times are in seconds from the start
//of the simulation. On load every function is padded with a sentinel
//pair far beyond any simulation end holding the last value, so a query
//can never wrap back to the first pair; queries beyond the sentinel
//are rejected.

use crate::constants::SENTINEL_TIME;
use crate::numerical::interpolation::lerp_segment;

#[derive(Debug)]
#[derive(Clone)]
#[derive(Default)]
pub struct TimeFunction {
    pub name: String,
    pub times: Vec<f64>,
    pub values: Vec<f64>,

    //player state: index of the lower bound of the current segment,
    //and the value interpolated at the last advance
    cursor: usize,
    pub current_value: f64,
}

impl TimeFunction {
    pub fn new(name: &str, times: Vec<f64>, values: Vec<f64>) -> Result<TimeFunction, String> {
        if times.is_empty() || times.len() != values.len() {
            return Err(format!("time function {} needs matching, non-empty time and value columns", name));
        }
        for k in 1..times.len() {
            if times[k] <= times[k - 1] {
                return Err(format!("time function {} times must be strictly increasing", name));
            }
        }

        let mut f = TimeFunction {
            name: name.to_string(),
            times,
            values,
            cursor: 0,
            current_value: f64::NAN,
        };

        //Pad with the sentinel pair (disables time-wrapping)
        let last = *f.values.last().unwrap();
        f.times.push(SENTINEL_TIME);
        f.values.push(last);
        Ok(f)
    }

    //A function that holds one value forever.
    pub fn constant(name: &str, value: f64) -> TimeFunction {
        TimeFunction::new(name, vec![0.0], vec![value]).unwrap()
    }

    //Evaluate the function at time t and cache the result. The cursor
    //only moves forward across ticks; a query earlier than the current
    //segment rewinds it.
    pub fn advance(&mut self, t: f64) -> Result<f64, String> {
        let n = self.times.len();
        if t > self.times[n - 1] {
            //beyond the sentinel: refuse rather than wrap around
            return Err(format!("time function {} queried at t = {} beyond its padded end", self.name, t));
        }
        if t < self.times[self.cursor] {
            self.cursor = 0;
        }
        while self.cursor + 1 < n && t >= self.times[self.cursor + 1] {
            self.cursor += 1;
        }
        let value = if self.cursor + 1 == n {
            self.values[self.cursor]
        } else {
            lerp_segment(
                self.times[self.cursor],
                self.values[self.cursor],
                self.times[self.cursor + 1],
                self.values[self.cursor + 1],
                t,
            )
        };
        self.current_value = value;
        Ok(value)
    }

    //Number of real (unpadded) pairs
    pub fn len(&self) -> usize {
        self.times.len() - 1
    }
}

//An external point flow applied to an overland cell (m3/s)
#[derive(Debug)]
#[derive(Clone)]
pub struct CellSource {
    pub row: usize,
    pub col: usize,
    pub function: usize,
}

//An external point flow applied to a channel node (m3/s)
#[derive(Debug)]
#[derive(Clone)]
pub struct NodeSource {
    pub link: usize,
    pub node: usize,
    pub function: usize,
}

//A solids mass load (g/s) applied to a cell or node water column
#[derive(Debug)]
#[derive(Clone)]
pub struct SolidsLoad {
    pub solid: usize,
    pub row_or_link: usize,
    pub col_or_node: usize,
    pub function: usize,
}

//All externally supplied time functions for a run, with the registries
//that bind them to locations. Function indices refer to `functions`.
#[derive(Debug)]
#[derive(Clone)]
#[derive(Default)]
pub struct Forcing {
    pub functions: Vec<TimeFunction>,

    pub rain: Option<usize>,            //uniform rainfall intensity (m/s)
    pub snow: Option<usize>,            //uniform snowfall swe intensity (m/s)
    pub qwov: Vec<CellSource>,          //overland water point flows
    pub qwch: Vec<NodeSource>,          //channel water point flows
    pub swov: Vec<SolidsLoad>,          //overland solids loads
    pub swch: Vec<SolidsLoad>,          //channel solids loads

    //per-outlet, per-solids boundary concentration (g/m3) for reverse
    //flow at the domain boundary; None means zero
    pub cbc: Vec<Vec<Option<usize>>>,
}

impl Forcing {
    pub fn new() -> Forcing {
        Forcing {
            ..Default::default()
        }
    }

    pub fn add_function(&mut self, function: TimeFunction) -> usize {
        self.functions.push(function);
        self.functions.len() - 1
    }

    //Advance every registered function to time t.
    pub fn advance_all(&mut self, t: f64) -> Result<(), String> {
        for f in self.functions.iter_mut() {
            f.advance(t)?;
        }
        Ok(())
    }

    pub fn value(&self, idx: usize) -> f64 {
        self.functions[idx].current_value
    }

    pub fn value_or_zero(&self, idx: Option<usize>) -> f64 {
        match idx {
            Some(k) => self.functions[k].current_value,
            None => 0.0,
        }
    }
}
