use colored::Colorize;
use std::path::Path;

pub fn handle(config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", "Validating stack configuration...".blue());

    match super::load_config(config_path) {
        Ok((path, config)) => {
            println!("Stack file: {}", path.display().to_string().cyan());
            println!("{}", "✓ Configuration is valid".green().bold());
            println!();
            println!("Summary:");
            println!("  Region: {}", config.region.cyan());

            let network = &config.network;
            println!(
                "  VPC: {} ({})",
                network.name.cyan(),
                network.cidr_block
            );
            println!(
                "    - {} private subnets, {} public subnets",
                network.private_subnets.len(),
                network.public_subnets.len()
            );
            println!(
                "    - {} NAT gateway(s){}",
                network.nat_gateway_count(),
                if network.nat_gateway_per_az {
                    " (one per public subnet)"
                } else {
                    ""
                }
            );

            let cluster = &config.cluster;
            println!(
                "  EKS cluster: {} (Kubernetes {})",
                cluster.name.cyan(),
                cluster.version
            );
            for (kind, groups) in [
                ("linux", &cluster.linux_node_groups),
                ("windows", &cluster.windows_node_groups),
            ] {
                for group in groups.values() {
                    println!(
                        "    - {} [{}] {} x{} (min {}, max {})",
                        group.name.cyan(),
                        kind,
                        group.instance_type,
                        group.desired_size,
                        group.min_size,
                        group.max_size
                    );
                }
            }
        }
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ Configuration error".red().bold());
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
