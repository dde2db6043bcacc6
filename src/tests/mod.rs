#[cfg(test)]
mod test_mathfn;

#[cfg(test)]
mod test_interpolation;


#[cfg(test)]
mod test_grid;

#[cfg(test)]
mod test_network;

#[cfg(test)]
mod test_channel_route;


#[cfg(test)]
mod test_overland_route;


#[cfg(test)]
mod test_erosion;


#[cfg(test)]
mod test_floodplain;



#[cfg(test)]
mod test_simulation;



#[cfg(test)]
mod test_ini_model_io;
