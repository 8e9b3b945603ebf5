use std::process;

fn main() {
    if let Err(err) = edgeline::app::run() {
        eprintln!("fatal: {err}");
        process::exit(1);
    }
}
