use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("inklink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: inklink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target: {}", env!("INKLINK_BUILD_TARGET"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!("default_baud: {}", inklink_transport::DEFAULT_BAUD_RATE);
    println!("max_packet_payload: {}", inklink_frame::MAX_PACKET_SIZE);

    Ok(SUCCESS)
}
