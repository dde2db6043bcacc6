use crate::io::ini_model_io::IniModelIO;
use crate::reporting::StationKind;

//Write a complete miniature model (grid, channel, forcing, reports)
//into a temp directory and read it back.
fn write_model_files() -> std::path::PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push("wadi_test_model");
    std::fs::create_dir_all(&dir).unwrap();

    std::fs::write(
        dir.join("mask.asc"),
        "ncols         3\r\nnrows         1\r\nxllcorner     0.0\r\nyllcorner     0.0\r\ncellsize      10.0\r\nNODATA_value  -9999\r\n1 1 1\r\n",
    )
    .unwrap();

    std::fs::write(
        dir.join("elev.asc"),
        "ncols         3\r\nnrows         1\r\nxllcorner     0.0\r\nyllcorner     0.0\r\ncellsize      10.0\r\nNODATA_value  -9999\r\n1.02 1.01 1.0\r\n",
    )
    .unwrap();

    std::fs::write(
        dir.join("channels.csv"),
        "link,node,row,col,bottom_width,bank_height,side_slope,n_manning,sinuosity,dead_storage,erodibility,m_exponent,transloss_rate\r\n\
         0,0,0,0,1.0,1.0,0.0,0.05,1.0,0.0,0.0,1.0,0.0\r\n\
         0,1,0,1,1.0,1.0,0.0,0.05,1.0,0.0,0.0,1.0,0.0\r\n\
         0,2,0,2,1.0,1.0,0.0,0.05,1.0,0.0,0.0,1.0,0.0\r\n",
    )
    .unwrap();

    std::fs::write(dir.join("links.csv"), "link,outlet,bed_slope_out\r\n0,0,0.001\r\n").unwrap();

    std::fs::write(dir.join("rain.csv"), "time_h,rain\r\n0.0,0.000001\r\n100.0,0.000001\r\n").unwrap();

    std::fs::write(
        dir.join("model.ini"),
        "[simulation]\n\
         dt = 1.0\n\
         n_steps = 10\n\
         report_interval = 1.0\n\
         \n\
         [grid]\n\
         mask = mask.asc\n\
         elevation = elev.asc\n\
         manning = 0.05\n\
         \n\
         [channels]\n\
         enabled = 1\n\
         nodes = channels.csv\n\
         links = links.csv\n\
         initial_depth = 0.2\n\
         \n\
         [solids]\n\
         count = 1\n\
         \n\
         [solid.1]\n\
         name = silt\n\
         spgravity = 2.65\n\
         ws = 0.0001\n\
         tau_ce = 0.2\n\
         tau_cd = 0.1\n\
         \n\
         [options]\n\
         fldopt = 1\n\
         ersovopt = 0\n\
         erschopt = 0\n\
         depovopt = 0\n\
         depchopt = 0\n\
         \n\
         [outlets]\n\
         count = 1\n\
         \n\
         [outlet.1]\n\
         row = 0\n\
         col = 2\n\
         bc = 0\n\
         bed_slope_ov = 0.001\n\
         \n\
         [forcing]\n\
         rain = rain.csv\n\
         \n\
         [reports]\n\
         stations = gauge,0,2,flow\n",
    )
    .unwrap();

    dir
}

#[test]
fn test_read_model_file_builds_simulation() {
    let dir = write_model_files();
    let model_path = dir.join("model.ini").to_string_lossy().to_string();

    let sim = IniModelIO::new().read_model_file(&model_path).unwrap();

    assert_eq!(sim.grid.nrows, 1);
    assert_eq!(sim.grid.ncols, 3);
    assert_eq!(sim.grid.cell_size, 10.0);
    assert_eq!(sim.n_steps, 10);
    assert_eq!(sim.dt, 1.0);

    //the channel link and its outlet arrived
    assert_eq!(sim.network.n_links(), 1);
    assert_eq!(sim.network.links[0].n_nodes(), 3);
    assert_eq!(sim.network.links[0].outlet, Some(0));
    assert!((sim.network.links[0].bed_slope_out - 0.001).abs() < 1e-12);

    //channel bed sits one bank height below the ground
    assert!((sim.network.links[0].nodes[0].bed_elevation - 0.02).abs() < 1e-12);

    //initial channel depth applied
    assert_eq!(sim.state.h_ch[0][1], 0.2);

    //solids class parsed
    assert_eq!(sim.solids.len(), 1);
    assert_eq!(sim.solids[0].name, "silt");
    assert!((sim.solids[0].tau_ce - 0.2).abs() < 1e-12);

    //rain bound and the station parsed
    assert!(sim.forcing.rain.is_some());
    assert_eq!(sim.reporter.stations.len(), 1);
    assert_eq!(sim.reporter.stations[0].kind, StationKind::Flow);
    assert_eq!(sim.reporter.stations[0].col, 2);
}

#[test]
fn test_model_runs_and_reports() {
    let dir = write_model_files();
    let model_path = dir.join("model.ini").to_string_lossy().to_string();

    let mut sim = IniModelIO::new().read_model_file(&model_path).unwrap();
    sim.run().unwrap();

    //water flowed down the link and the gauge sampled every tick
    assert!(sim.state.q_out_link_vol[0] > 0.0);
    assert_eq!(sim.reporter.times.len(), 10);

    let summary = sim.summary();
    assert!(summary.water.residual.abs() < 1.0e-6);
}

#[test]
fn test_missing_key_is_reported() {
    let mut dir = std::env::temp_dir();
    dir.push("wadi_test_bad_model");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("empty.ini"), "[simulation]\ndt = 1.0\n").unwrap();

    let model_path = dir.join("empty.ini").to_string_lossy().to_string();
    let err = IniModelIO::new().read_model_file(&model_path).unwrap_err();
    assert!(err.contains("n_steps"));
}
