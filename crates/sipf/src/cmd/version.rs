use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("sipf {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    let firmware = sipf_cmd::FirmwareInfo::default();
    println!("name: sipf");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "firmware: Type{:02x} v.{}.{}.{}",
        firmware.fw_type, firmware.major, firmware.minor, firmware.release
    );
    println!(
        "target: {}",
        option_env!("SIPF_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "commands: {}",
        sipf_cmd::COMMAND_TABLE
            .iter()
            .map(|kind| kind.name())
            .collect::<Vec<_>>()
            .join(" ")
    );

    Ok(SUCCESS)
}
