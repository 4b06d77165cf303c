use std::time::{Duration, SystemTime, UNIX_EPOCH};

use inklink_link::connect_with_config;
use tracing::warn;

use crate::cmd::{parse_duration, runtime, HibernateArgs, LinkOptions};
use crate::exit::{link_error, CliError, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat, Record};

pub fn run(args: HibernateArgs, options: &LinkOptions, format: OutputFormat) -> CliResult<i32> {
    let until = wake_time(&args, SystemTime::now())?;
    if until <= SystemTime::now() {
        warn!("wake-up time has passed; the display will wake immediately");
    }
    let config = options.config()?;

    let command = runtime()?.block_on(async {
        let link = connect_with_config(&args.port, options.baud, config)
            .map_err(|err| link_error("connect failed", err))?;
        link.send_hibernation_request(until, args.device)
            .await
            .map_err(|err| link_error("hibernation request failed", err))
    })?;

    print_record(&Record::hibernation(&args.port, args.device, &command), format);
    Ok(SUCCESS)
}

fn wake_time(args: &HibernateArgs, now: SystemTime) -> CliResult<SystemTime> {
    match (&args.wake_in, args.at) {
        (Some(wake_in), _) => Ok(now + parse_duration(wake_in)?),
        (None, Some(at)) => Ok(UNIX_EPOCH + Duration::from_secs(at)),
        (None, None) => Err(CliError::usage("one of --in or --at is required")),
    }
}
