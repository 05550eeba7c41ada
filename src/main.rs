fn main() -> anyhow::Result<()> {
    mapforge::run()
}
