use {
    clap::Parser,
    gridpath::{solvers::solvers, Args},
};

fn main() {
    solvers().run(&Args::parse());
}
