use field_viewer::{framework, simulation::Simulation, Config};

fn main() {
    env_logger::init();

    let config = Config::from_env();
    if let Err(err) = framework::run::<Simulation>("Fluid Simulation", &config) {
        if !err.is_fatal() {
            log::error!("Aborting on shader failure because FIELD_STRICT_SHADERS is set");
        }
        log::error!("{err}");
        std::process::exit(1);
    }
}
