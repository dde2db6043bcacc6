//The State Store.
//
//Owns every grid, stack and accumulator the solver mutates. Components
//read the "current" buffers and write the "new" buffers; the store
//swaps the pairs once per tick. All buffers are sized at init; nothing
//allocates inside a tick (layer push/pop runs between ticks).
//
//Index conventions: overland fields are [row][col] (solids fields
//[solid][row][col]); channel fields are [link][node]; direction-keyed
//fields carry a fixed [f64; NDIRS] per slot; bed fields carry one
//entry per stack layer, index 0 at the bottom, surface on top.

use crate::constants::NDIRS;
use crate::grid::Grid;
use crate::network::ChannelNetwork;
use crate::solids::SolidsClass;

pub type CellGrid = Vec<Vec<f64>>;
pub type CellDirGrid = Vec<Vec<[f64; NDIRS]>>;
pub type ChanField = Vec<Vec<f64>>;
pub type ChanDirField = Vec<Vec<[f64; NDIRS]>>;

fn cell_grid(nrows: usize, ncols: usize) -> CellGrid {
    vec![vec![0.0; ncols]; nrows]
}

fn cell_dir_grid(nrows: usize, ncols: usize) -> CellDirGrid {
    vec![vec![[0.0; NDIRS]; ncols]; nrows]
}

fn chan_field(network: &ChannelNetwork) -> ChanField {
    network.links.iter().map(|l| vec![0.0; l.n_nodes()]).collect()
}

fn chan_dir_field(network: &ChannelNetwork) -> ChanDirField {
    network.links.iter().map(|l| vec![[0.0; NDIRS]; l.n_nodes()]).collect()
}

#[derive(Debug)]
#[derive(Clone)]
pub struct State {
    pub nsolids: usize,

    //=== overland water ===
    pub h_ov: CellGrid,             //water depth (m)
    pub h_ov_new: CellGrid,
    pub swe_ov: CellGrid,           //snowpack as snow water equivalent (m)
    pub swe_ov_new: CellGrid,
    pub dqov: CellGrid,             //net flow (m3/s)
    pub dqov_in: CellDirGrid,       //gross inflow by source (m3/s)
    pub dqov_out: CellDirGrid,      //gross outflow by source (m3/s)
    pub sf_ov: CellDirGrid,         //friction slope by direction

    //forcing rates painted per tick (m/s)
    pub gross_rain_rate: CellGrid,
    pub net_rain_rate: CellGrid,
    pub gross_swe_rate: CellGrid,
    pub net_swe_rate: CellGrid,

    //cumulative overland water volumes (m3)
    pub dqov_in_vol: CellDirGrid,
    pub dqov_out_vol: CellDirGrid,
    pub gross_rain_vol: CellGrid,
    pub net_rain_vol: CellGrid,
    pub net_swe_vol: CellGrid,
    pub qwov_vol: CellGrid,         //external point flow volume

    //=== channel water ===
    pub h_ch: ChanField,
    pub h_ch_new: ChanField,
    pub dqch: ChanField,
    pub dqch_in: ChanDirField,
    pub dqch_out: ChanDirField,
    pub sf_ch: ChanField,

    pub transloss_depth: ChanField, //cumulative transmission loss depth (m)
    pub transloss_vol: ChanField,   //cumulative transmission loss volume (m3)
    pub dqch_in_vol: ChanDirField,
    pub dqch_out_vol: ChanDirField,
    pub qwch_vol: ChanField,

    //boundary flow per link, this tick and cumulative
    pub q_in_link: Vec<f64>,
    pub q_out_link: Vec<f64>,
    pub q_in_link_vol: Vec<f64>,
    pub q_out_link_vol: Vec<f64>,

    //overland boundary flow per outlet, this tick and cumulative
    pub q_out_ov: Vec<f64>,
    pub q_out_ov_vol: Vec<f64>,

    //peak flow trackers per outlet (monotone within a run)
    pub q_peak_ch: Vec<f64>,
    pub t_peak_ch: Vec<f64>,
    pub q_peak_ov: Vec<f64>,
    pub t_peak_ov: Vec<f64>,

    //running maximum Courant numbers (this tick)
    pub max_courant_ov: f64,
    pub max_courant_ch: f64,

    //=== solids: water column concentrations (g/m3) ===
    pub conc_ov: Vec<CellGrid>,
    pub conc_ov_new: Vec<CellGrid>,
    pub conc_ch: Vec<ChanField>,
    pub conc_ch_new: Vec<ChanField>,

    //=== solids: bed/soil layer stacks ===
    pub nstack_ov: Vec<Vec<usize>>,
    pub vlayer_ov: Vec<Vec<Vec<f64>>>,          //[row][col][layer] volume (m3)
    pub vlayer_ov_new: Vec<Vec<Vec<f64>>>,
    pub min_vlayer_ov: Vec<Vec<Vec<f64>>>,
    pub max_vlayer_ov: Vec<Vec<Vec<f64>>>,
    pub porosity_ov: Vec<Vec<Vec<f64>>>,
    pub abed_ov: Vec<Vec<Vec<f64>>>,            //bed surface area (m2)
    pub conc_bed_ov: Vec<Vec<Vec<Vec<f64>>>>,   //[solid][row][col][layer] (g/m3)
    pub conc_bed_ov_new: Vec<Vec<Vec<Vec<f64>>>>,

    pub nstack_ch: Vec<Vec<usize>>,
    pub vlayer_ch: Vec<Vec<Vec<f64>>>,          //[link][node][layer]
    pub vlayer_ch_new: Vec<Vec<Vec<f64>>>,
    pub min_vlayer_ch: Vec<Vec<Vec<f64>>>,
    pub max_vlayer_ch: Vec<Vec<Vec<f64>>>,
    pub porosity_ch: Vec<Vec<Vec<f64>>>,
    pub abed_ch: Vec<Vec<Vec<f64>>>,
    pub conc_bed_ch: Vec<Vec<Vec<Vec<f64>>>>,
    pub conc_bed_ch_new: Vec<Vec<Vec<Vec<f64>>>>,

    //stack signals raised by the bed integrator, consumed between ticks
    pub push_ov: Vec<Vec<bool>>,
    pub pop_ov: Vec<Vec<bool>>,
    pub push_ch: Vec<Vec<bool>>,
    pub pop_ch: Vec<Vec<bool>>,

    //shear-stress exposure history for cohesive erosion
    pub tau_max_ov: CellGrid,
    pub tau_max_time_ov: CellGrid,
    pub tau_max_ch: ChanField,
    pub tau_max_time_ch: ChanField,

    //=== solids process fluxes, recomputed each tick (g/s) ===
    pub adv_ov_influx: Vec<CellDirGrid>,
    pub adv_ov_outflux: Vec<CellDirGrid>,
    pub dsp_ov_influx: Vec<CellDirGrid>,
    pub dsp_ov_outflux: Vec<CellDirGrid>,
    pub dep_ov_outflux_wc: Vec<CellGrid>,   //leaving the water column
    pub dep_ov_influx_bed: Vec<CellGrid>,   //entering the surface layer
    pub ers_ov_outflux_bed: Vec<CellGrid>,  //leaving the surface layer
    pub ers_ov_influx_wc: Vec<CellGrid>,    //entering the water column
    pub dep_flow_ov: Vec<CellGrid>,         //effective deposition flow (m3/s)
    pub ers_flow_ov: Vec<CellGrid>,         //effective erosion flow (m3/s)
    pub transcap_ov: Vec<CellGrid>,         //transport capacity (g/s)
    pub transrate_ov: Vec<CellGrid>,        //transport rate (g/s)

    pub adv_ch_influx: Vec<ChanDirField>,
    pub adv_ch_outflux: Vec<ChanDirField>,
    pub dsp_ch_influx: Vec<ChanDirField>,
    pub dsp_ch_outflux: Vec<ChanDirField>,
    pub dep_ch_outflux_wc: Vec<ChanField>,
    pub dep_ch_influx_bed: Vec<ChanField>,
    pub ers_ch_outflux_bed: Vec<ChanField>,
    pub ers_ch_influx_wc: Vec<ChanField>,
    pub dep_flow_ch: Vec<ChanField>,
    pub ers_flow_ch: Vec<ChanField>,
    pub transcap_ch: Vec<ChanField>,
    pub transrate_ch: Vec<ChanField>,

    //kinetics hook: aggregate reaction fluxes a kinetics collaborator
    //may populate before the concentration integrators run (g/s)
    pub kin_ov_influx: Vec<CellGrid>,
    pub kin_ov_outflux: Vec<CellGrid>,
    pub kin_ch_influx: Vec<ChanField>,
    pub kin_ch_outflux: Vec<ChanField>,

    //=== solids cumulative masses (kg) ===
    pub adv_ov_inmass: Vec<CellDirGrid>,
    pub adv_ov_outmass: Vec<CellDirGrid>,
    pub dsp_ov_inmass: Vec<CellDirGrid>,
    pub dsp_ov_outmass: Vec<CellDirGrid>,
    pub dep_ov_outmass_wc: Vec<CellGrid>,
    pub dep_ov_inmass_bed: Vec<CellGrid>,
    pub ers_ov_outmass_bed: Vec<CellGrid>,
    pub ers_ov_inmass_wc: Vec<CellGrid>,

    pub adv_ch_inmass: Vec<ChanDirField>,
    pub adv_ch_outmass: Vec<ChanDirField>,
    pub dsp_ch_inmass: Vec<ChanDirField>,
    pub dsp_ch_outmass: Vec<ChanDirField>,
    pub dep_ch_outmass_wc: Vec<ChanField>,
    pub dep_ch_inmass_bed: Vec<ChanField>,
    pub ers_ch_outmass_bed: Vec<ChanField>,
    pub ers_ch_inmass_wc: Vec<ChanField>,

    //net point-source solids mass entering the domain (kg), per class
    pub total_load_ov: Vec<f64>,
    pub total_load_ch: Vec<f64>,

    //per-class boundary totals by outlet (kg): [solid][outlet]
    pub total_adv_sed_out_ch: Vec<Vec<f64>>,
    pub total_adv_sed_in_ch: Vec<Vec<f64>>,
    pub total_dsp_sed_out_ch: Vec<Vec<f64>>,
    pub total_dsp_sed_in_ch: Vec<Vec<f64>>,
    pub total_adv_sed_out_ov: Vec<Vec<f64>>,
    pub total_adv_sed_in_ov: Vec<Vec<f64>>,

    //peak solids discharge by outlet (kg/s): [class][outlet] where
    //class 0 is the total over all classes and class s is solid s-1
    pub sedflow_peak_ch: Vec<Vec<f64>>,
    pub sedtime_peak_ch: Vec<Vec<f64>>,
    pub sedflow_peak_ov: Vec<Vec<f64>>,
    pub sedtime_peak_ov: Vec<Vec<f64>>,
}

impl State {
    pub fn new(grid: &Grid, network: &ChannelNetwork, nsolids: usize) -> State {
        let (nr, nc) = (grid.nrows, grid.ncols);
        let nout = network.outlets.len();
        let nlinks = network.n_links();

        let solids_cell = || (0..nsolids).map(|_| cell_grid(nr, nc)).collect::<Vec<_>>();
        let solids_cell_dir = || (0..nsolids).map(|_| cell_dir_grid(nr, nc)).collect::<Vec<_>>();
        let solids_chan = || (0..nsolids).map(|_| chan_field(network)).collect::<Vec<_>>();
        let solids_chan_dir = || (0..nsolids).map(|_| chan_dir_field(network)).collect::<Vec<_>>();
        let chan_layers = || {
            network
                .links
                .iter()
                .map(|l| vec![Vec::<f64>::new(); l.n_nodes()])
                .collect::<Vec<_>>()
        };
        let cell_layers = || vec![vec![Vec::<f64>::new(); nc]; nr];

        State {
            nsolids,

            h_ov: cell_grid(nr, nc),
            h_ov_new: cell_grid(nr, nc),
            swe_ov: cell_grid(nr, nc),
            swe_ov_new: cell_grid(nr, nc),
            dqov: cell_grid(nr, nc),
            dqov_in: cell_dir_grid(nr, nc),
            dqov_out: cell_dir_grid(nr, nc),
            sf_ov: cell_dir_grid(nr, nc),

            gross_rain_rate: cell_grid(nr, nc),
            net_rain_rate: cell_grid(nr, nc),
            gross_swe_rate: cell_grid(nr, nc),
            net_swe_rate: cell_grid(nr, nc),

            dqov_in_vol: cell_dir_grid(nr, nc),
            dqov_out_vol: cell_dir_grid(nr, nc),
            gross_rain_vol: cell_grid(nr, nc),
            net_rain_vol: cell_grid(nr, nc),
            net_swe_vol: cell_grid(nr, nc),
            qwov_vol: cell_grid(nr, nc),

            h_ch: chan_field(network),
            h_ch_new: chan_field(network),
            dqch: chan_field(network),
            dqch_in: chan_dir_field(network),
            dqch_out: chan_dir_field(network),
            sf_ch: chan_field(network),

            transloss_depth: chan_field(network),
            transloss_vol: chan_field(network),
            dqch_in_vol: chan_dir_field(network),
            dqch_out_vol: chan_dir_field(network),
            qwch_vol: chan_field(network),

            q_in_link: vec![0.0; nlinks],
            q_out_link: vec![0.0; nlinks],
            q_in_link_vol: vec![0.0; nlinks],
            q_out_link_vol: vec![0.0; nlinks],

            q_out_ov: vec![0.0; nout],
            q_out_ov_vol: vec![0.0; nout],

            q_peak_ch: vec![0.0; nout],
            t_peak_ch: vec![0.0; nout],
            q_peak_ov: vec![0.0; nout],
            t_peak_ov: vec![0.0; nout],

            max_courant_ov: -1.0,
            max_courant_ch: -1.0,

            conc_ov: solids_cell(),
            conc_ov_new: solids_cell(),
            conc_ch: solids_chan(),
            conc_ch_new: solids_chan(),

            nstack_ov: vec![vec![1; nc]; nr],
            vlayer_ov: cell_layers(),
            vlayer_ov_new: cell_layers(),
            min_vlayer_ov: cell_layers(),
            max_vlayer_ov: cell_layers(),
            porosity_ov: cell_layers(),
            abed_ov: cell_layers(),
            conc_bed_ov: (0..nsolids).map(|_| cell_layers()).collect(),
            conc_bed_ov_new: (0..nsolids).map(|_| cell_layers()).collect(),

            nstack_ch: network.links.iter().map(|l| vec![1; l.n_nodes()]).collect(),
            vlayer_ch: chan_layers(),
            vlayer_ch_new: chan_layers(),
            min_vlayer_ch: chan_layers(),
            max_vlayer_ch: chan_layers(),
            porosity_ch: chan_layers(),
            abed_ch: chan_layers(),
            conc_bed_ch: (0..nsolids).map(|_| chan_layers()).collect(),
            conc_bed_ch_new: (0..nsolids).map(|_| chan_layers()).collect(),

            push_ov: vec![vec![false; nc]; nr],
            pop_ov: vec![vec![false; nc]; nr],
            push_ch: network.links.iter().map(|l| vec![false; l.n_nodes()]).collect(),
            pop_ch: network.links.iter().map(|l| vec![false; l.n_nodes()]).collect(),

            tau_max_ov: cell_grid(nr, nc),
            tau_max_time_ov: cell_grid(nr, nc),
            tau_max_ch: chan_field(network),
            tau_max_time_ch: chan_field(network),

            adv_ov_influx: solids_cell_dir(),
            adv_ov_outflux: solids_cell_dir(),
            dsp_ov_influx: solids_cell_dir(),
            dsp_ov_outflux: solids_cell_dir(),
            dep_ov_outflux_wc: solids_cell(),
            dep_ov_influx_bed: solids_cell(),
            ers_ov_outflux_bed: solids_cell(),
            ers_ov_influx_wc: solids_cell(),
            dep_flow_ov: solids_cell(),
            ers_flow_ov: solids_cell(),
            transcap_ov: solids_cell(),
            transrate_ov: solids_cell(),

            adv_ch_influx: solids_chan_dir(),
            adv_ch_outflux: solids_chan_dir(),
            dsp_ch_influx: solids_chan_dir(),
            dsp_ch_outflux: solids_chan_dir(),
            dep_ch_outflux_wc: solids_chan(),
            dep_ch_influx_bed: solids_chan(),
            ers_ch_outflux_bed: solids_chan(),
            ers_ch_influx_wc: solids_chan(),
            dep_flow_ch: solids_chan(),
            ers_flow_ch: solids_chan(),
            transcap_ch: solids_chan(),
            transrate_ch: solids_chan(),

            kin_ov_influx: solids_cell(),
            kin_ov_outflux: solids_cell(),
            kin_ch_influx: solids_chan(),
            kin_ch_outflux: solids_chan(),

            adv_ov_inmass: solids_cell_dir(),
            adv_ov_outmass: solids_cell_dir(),
            dsp_ov_inmass: solids_cell_dir(),
            dsp_ov_outmass: solids_cell_dir(),
            dep_ov_outmass_wc: solids_cell(),
            dep_ov_inmass_bed: solids_cell(),
            ers_ov_outmass_bed: solids_cell(),
            ers_ov_inmass_wc: solids_cell(),

            adv_ch_inmass: solids_chan_dir(),
            adv_ch_outmass: solids_chan_dir(),
            dsp_ch_inmass: solids_chan_dir(),
            dsp_ch_outmass: solids_chan_dir(),
            dep_ch_outmass_wc: solids_chan(),
            dep_ch_inmass_bed: solids_chan(),
            ers_ch_outmass_bed: solids_chan(),
            ers_ch_inmass_wc: solids_chan(),

            total_load_ov: vec![0.0; nsolids],
            total_load_ch: vec![0.0; nsolids],

            total_adv_sed_out_ch: vec![vec![0.0; nout]; nsolids],
            total_adv_sed_in_ch: vec![vec![0.0; nout]; nsolids],
            total_dsp_sed_out_ch: vec![vec![0.0; nout]; nsolids],
            total_dsp_sed_in_ch: vec![vec![0.0; nout]; nsolids],
            total_adv_sed_out_ov: vec![vec![0.0; nout]; nsolids],
            total_adv_sed_in_ov: vec![vec![0.0; nout]; nsolids],

            sedflow_peak_ch: vec![vec![0.0; nout]; nsolids + 1],
            sedtime_peak_ch: vec![vec![0.0; nout]; nsolids + 1],
            sedflow_peak_ov: vec![vec![0.0; nout]; nsolids + 1],
            sedtime_peak_ov: vec![vec![0.0; nout]; nsolids + 1],
        }
    }

    //Install a soil layer stack at an overland cell. Layers are given
    //bottom-up; concentrations are per solid, per layer (g/m3).
    pub fn set_soil_stack(
        &mut self,
        row: usize,
        col: usize,
        volumes: Vec<f64>,
        porosities: Vec<f64>,
        bed_area: f64,
        vmin: f64,
        vmax: f64,
        concentrations: Vec<Vec<f64>>,
    ) {
        let nstack = volumes.len();
        self.nstack_ov[row][col] = nstack;
        self.vlayer_ov[row][col] = volumes.clone();
        self.vlayer_ov_new[row][col] = volumes;
        self.porosity_ov[row][col] = porosities;
        self.abed_ov[row][col] = vec![bed_area; nstack];
        self.min_vlayer_ov[row][col] = vec![vmin; nstack];
        self.max_vlayer_ov[row][col] = vec![vmax; nstack];
        for s in 0..self.nsolids {
            self.conc_bed_ov[s][row][col] = concentrations[s].clone();
            self.conc_bed_ov_new[s][row][col] = concentrations[s].clone();
        }
    }

    //Install a sediment layer stack at a channel node.
    pub fn set_sediment_stack(
        &mut self,
        link: usize,
        node: usize,
        volumes: Vec<f64>,
        porosities: Vec<f64>,
        bed_area: f64,
        vmin: f64,
        vmax: f64,
        concentrations: Vec<Vec<f64>>,
    ) {
        let nstack = volumes.len();
        self.nstack_ch[link][node] = nstack;
        self.vlayer_ch[link][node] = volumes.clone();
        self.vlayer_ch_new[link][node] = volumes;
        self.porosity_ch[link][node] = porosities;
        self.abed_ch[link][node] = vec![bed_area; nstack];
        self.min_vlayer_ch[link][node] = vec![vmin; nstack];
        self.max_vlayer_ch[link][node] = vec![vmax; nstack];
        for s in 0..self.nsolids {
            self.conc_bed_ch[s][link][node] = concentrations[s].clone();
            self.conc_bed_ch_new[s][link][node] = concentrations[s].clone();
        }
    }

    //Swap "new" into "current" at the end of a tick. Only the fields
    //the integrators double-buffer take part.
    pub fn swap_states(&mut self) {
        std::mem::swap(&mut self.h_ov, &mut self.h_ov_new);
        std::mem::swap(&mut self.swe_ov, &mut self.swe_ov_new);
        std::mem::swap(&mut self.h_ch, &mut self.h_ch_new);
        std::mem::swap(&mut self.conc_ov, &mut self.conc_ov_new);
        std::mem::swap(&mut self.conc_ch, &mut self.conc_ch_new);
        std::mem::swap(&mut self.conc_bed_ov, &mut self.conc_bed_ov_new);
        std::mem::swap(&mut self.conc_bed_ch, &mut self.conc_bed_ch_new);
        std::mem::swap(&mut self.vlayer_ov, &mut self.vlayer_ov_new);
        std::mem::swap(&mut self.vlayer_ch, &mut self.vlayer_ch_new);
    }

    //Zero the per-tick overland flow arrays.
    pub fn reset_overland_flows(&mut self) {
        for row in 0..self.h_ov.len() {
            for col in 0..self.h_ov[row].len() {
                self.dqov[row][col] = 0.0;
                self.dqov_in[row][col] = [0.0; NDIRS];
                self.dqov_out[row][col] = [0.0; NDIRS];
                self.sf_ov[row][col] = [0.0; NDIRS];
            }
        }
        for k in 0..self.q_out_ov.len() {
            self.q_out_ov[k] = 0.0;
        }
        self.max_courant_ov = -1.0;
    }

    //Zero the per-tick channel flow arrays.
    pub fn reset_channel_flows(&mut self) {
        for l in 0..self.h_ch.len() {
            self.q_in_link[l] = 0.0;
            self.q_out_link[l] = 0.0;
            for j in 0..self.h_ch[l].len() {
                self.dqch[l][j] = 0.0;
                self.dqch_in[l][j] = [0.0; NDIRS];
                self.dqch_out[l][j] = [0.0; NDIRS];
            }
        }
        self.max_courant_ch = -1.0;
    }

    //Zero the per-tick solids flux arrays (advection, dispersion,
    //deposition, erosion, kinetics aggregates).
    pub fn reset_solids_fluxes(&mut self) {
        for s in 0..self.nsolids {
            for row in 0..self.h_ov.len() {
                for col in 0..self.h_ov[row].len() {
                    self.adv_ov_influx[s][row][col] = [0.0; NDIRS];
                    self.adv_ov_outflux[s][row][col] = [0.0; NDIRS];
                    self.dsp_ov_influx[s][row][col] = [0.0; NDIRS];
                    self.dsp_ov_outflux[s][row][col] = [0.0; NDIRS];
                    self.dep_ov_outflux_wc[s][row][col] = 0.0;
                    self.dep_ov_influx_bed[s][row][col] = 0.0;
                    self.ers_ov_outflux_bed[s][row][col] = 0.0;
                    self.ers_ov_influx_wc[s][row][col] = 0.0;
                    self.dep_flow_ov[s][row][col] = 0.0;
                    self.ers_flow_ov[s][row][col] = 0.0;
                    self.kin_ov_influx[s][row][col] = 0.0;
                    self.kin_ov_outflux[s][row][col] = 0.0;
                }
            }
            for l in 0..self.h_ch.len() {
                for j in 0..self.h_ch[l].len() {
                    self.adv_ch_influx[s][l][j] = [0.0; NDIRS];
                    self.adv_ch_outflux[s][l][j] = [0.0; NDIRS];
                    self.dsp_ch_influx[s][l][j] = [0.0; NDIRS];
                    self.dsp_ch_outflux[s][l][j] = [0.0; NDIRS];
                    self.dep_ch_outflux_wc[s][l][j] = 0.0;
                    self.dep_ch_influx_bed[s][l][j] = 0.0;
                    self.ers_ch_outflux_bed[s][l][j] = 0.0;
                    self.ers_ch_influx_wc[s][l][j] = 0.0;
                    self.dep_flow_ch[s][l][j] = 0.0;
                    self.ers_flow_ch[s][l][j] = 0.0;
                    self.kin_ch_influx[s][l][j] = 0.0;
                    self.kin_ch_outflux[s][l][j] = 0.0;
                }
            }
        }
    }

    //Consume push/pop signals between ticks. A push buries the surface
    //layer and opens a fresh empty one above it (bounded by nstack_max);
    //a pop folds the residual surface layer into the layer below.
    pub fn apply_stack_signals(&mut self, solids: &[SolidsClass], nstack_max: usize) {
        for row in 0..self.push_ov.len() {
            for col in 0..self.push_ov[row].len() {
                if self.push_ov[row][col] {
                    self.push_ov[row][col] = false;
                    if self.nstack_ov[row][col] < nstack_max {
                        push_layer_cell(self, row, col);
                    }
                }
                if self.pop_ov[row][col] {
                    self.pop_ov[row][col] = false;
                    if self.nstack_ov[row][col] > 1 {
                        pop_layer_cell(self, solids, row, col);
                    }
                }
            }
        }
        for l in 0..self.push_ch.len() {
            for j in 0..self.push_ch[l].len() {
                if self.push_ch[l][j] {
                    self.push_ch[l][j] = false;
                    if self.nstack_ch[l][j] < nstack_max {
                        push_layer_node(self, l, j);
                    }
                }
                if self.pop_ch[l][j] {
                    self.pop_ch[l][j] = false;
                    if self.nstack_ch[l][j] > 1 {
                        pop_layer_node(self, solids, l, j);
                    }
                }
            }
        }
    }
}

fn push_layer_cell(state: &mut State, row: usize, col: usize) {
    let top = state.nstack_ov[row][col] - 1;
    let porosity = state.porosity_ov[row][col][top];
    let area = state.abed_ov[row][col][top];
    let vmin = state.min_vlayer_ov[row][col][top];
    let vmax = state.max_vlayer_ov[row][col][top];
    state.vlayer_ov[row][col].push(0.0);
    state.vlayer_ov_new[row][col].push(0.0);
    state.porosity_ov[row][col].push(porosity);
    state.abed_ov[row][col].push(area);
    state.min_vlayer_ov[row][col].push(vmin);
    state.max_vlayer_ov[row][col].push(vmax);
    for s in 0..state.nsolids {
        state.conc_bed_ov[s][row][col].push(0.0);
        state.conc_bed_ov_new[s][row][col].push(0.0);
    }
    state.nstack_ov[row][col] += 1;
}

fn pop_layer_cell(state: &mut State, solids: &[SolidsClass], row: usize, col: usize) {
    let top = state.nstack_ov[row][col] - 1;
    let below = top - 1;
    let v_top = state.vlayer_ov[row][col][top];
    let v_below = state.vlayer_ov[row][col][below];
    let v_sum = v_top + v_below;
    for s in 0..solids.len() {
        let m_top = state.conc_bed_ov[s][row][col][top] * v_top;
        let m_below = state.conc_bed_ov[s][row][col][below] * v_below;
        let c = if v_sum > 0.0 { (m_top + m_below) / v_sum } else { 0.0 };
        state.conc_bed_ov[s][row][col][below] = c;
        state.conc_bed_ov_new[s][row][col][below] = c;
        state.conc_bed_ov[s][row][col].pop();
        state.conc_bed_ov_new[s][row][col].pop();
    }
    state.vlayer_ov[row][col][below] = v_sum;
    state.vlayer_ov_new[row][col][below] = v_sum;
    state.vlayer_ov[row][col].pop();
    state.vlayer_ov_new[row][col].pop();
    state.porosity_ov[row][col].pop();
    state.abed_ov[row][col].pop();
    state.min_vlayer_ov[row][col].pop();
    state.max_vlayer_ov[row][col].pop();
    state.nstack_ov[row][col] -= 1;
}

fn push_layer_node(state: &mut State, link: usize, node: usize) {
    let top = state.nstack_ch[link][node] - 1;
    let porosity = state.porosity_ch[link][node][top];
    let area = state.abed_ch[link][node][top];
    let vmin = state.min_vlayer_ch[link][node][top];
    let vmax = state.max_vlayer_ch[link][node][top];
    state.vlayer_ch[link][node].push(0.0);
    state.vlayer_ch_new[link][node].push(0.0);
    state.porosity_ch[link][node].push(porosity);
    state.abed_ch[link][node].push(area);
    state.min_vlayer_ch[link][node].push(vmin);
    state.max_vlayer_ch[link][node].push(vmax);
    for s in 0..state.nsolids {
        state.conc_bed_ch[s][link][node].push(0.0);
        state.conc_bed_ch_new[s][link][node].push(0.0);
    }
    state.nstack_ch[link][node] += 1;
}

fn pop_layer_node(state: &mut State, solids: &[SolidsClass], link: usize, node: usize) {
    let top = state.nstack_ch[link][node] - 1;
    let below = top - 1;
    let v_top = state.vlayer_ch[link][node][top];
    let v_below = state.vlayer_ch[link][node][below];
    let v_sum = v_top + v_below;
    for s in 0..solids.len() {
        let m_top = state.conc_bed_ch[s][link][node][top] * v_top;
        let m_below = state.conc_bed_ch[s][link][node][below] * v_below;
        let c = if v_sum > 0.0 { (m_top + m_below) / v_sum } else { 0.0 };
        state.conc_bed_ch[s][link][node][below] = c;
        state.conc_bed_ch_new[s][link][node][below] = c;
        state.conc_bed_ch[s][link][node].pop();
        state.conc_bed_ch_new[s][link][node].pop();
    }
    state.vlayer_ch[link][node][below] = v_sum;
    state.vlayer_ch_new[link][node][below] = v_sum;
    state.vlayer_ch[link][node].pop();
    state.vlayer_ch_new[link][node].pop();
    state.porosity_ch[link][node].pop();
    state.abed_ch[link][node].pop();
    state.min_vlayer_ch[link][node].pop();
    state.max_vlayer_ch[link][node].pop();
    state.nstack_ch[link][node] -= 1;
}
