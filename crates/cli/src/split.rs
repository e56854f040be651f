use assetres_core::path::{is_package_relative, split_inner, split_outer};

pub fn run(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !is_package_relative(path) {
        println!("{} is not package-relative", path);
        return Ok(());
    }

    let mut level = 0;
    let mut rest = path.to_string();
    while is_package_relative(&rest) {
        let (outer, packaged) = split_outer(&rest);
        println!("{:indent$}{}", "", outer, indent = level * 2);
        rest = packaged.to_string();
        level += 1;
    }
    println!("{:indent$}{}", "", rest, indent = level * 2);

    let (package, leaf) = split_inner(path);
    println!();
    println!("Innermost package: {}", package);
    println!("Packaged asset:    {}", leaf);
    Ok(())
}
