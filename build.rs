use std::fs;

const SECTIONS: [&str; 3] = ["endpoint", "upload", "report"];

fn main() {
    let config_path = "src/default_config.toml";
    println!("cargo:rerun-if-changed={config_path}");

    let content = fs::read_to_string(config_path).expect("Failed to read default_config.toml");

    let table = match content.parse::<toml::Table>() {
        Ok(table) => table,
        Err(e) => panic!("Invalid default_config.toml: {e}"),
    };

    // Every section must be spelled out so the bundled file doubles as documentation
    for section in SECTIONS {
        if !table.get(section).is_some_and(toml::Value::is_table) {
            panic!("default_config.toml is missing the [{section}] table");
        }
    }
}
