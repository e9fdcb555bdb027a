fn main() {
    if let Err(err) = gramps_tree_render::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
