use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    let version = env!("CARGO_PKG_VERSION");
    if !args.extended {
        println!("jsonsock {version}");
        return Ok(SUCCESS);
    }

    println!("name: jsonsock");
    println!("version: {version}");
    println!(
        "build_target: {}",
        option_env!("JSONSOCK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "features: peer={}, async={}, cli=true",
        cfg!(feature = "peer"),
        cfg!(feature = "async")
    );
    println!(
        "wire: u32 length prefix, max payload {} bytes by default",
        jsonsock_frame::DEFAULT_MAX_PAYLOAD
    );

    Ok(SUCCESS)
}
