use anyhow::Context;

fn main() -> anyhow::Result<()> {
    docanalysis::logging::init();
    docanalysis::run(std::env::args().skip(1)).context("page extraction failed")
}
