use std::time::SystemTime;

use inklink_link::connect_with_config;

use crate::cmd::{parse_duration, runtime, LinkOptions, UpdateArgs};
use crate::exit::{link_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat, Record};
use crate::pnm::load_bitmap;

pub fn run(args: UpdateArgs, options: &LinkOptions, format: OutputFormat) -> CliResult<i32> {
    let bitmap = load_bitmap(&args.file)?;
    let sleep_for = parse_duration(&args.wake_in)?;
    let settle = parse_duration(&args.settle)?;
    let config = options.config()?;

    let report = runtime()?.block_on(async {
        let link = connect_with_config(&args.port, options.baud, config)
            .map_err(|err| link_error("connect failed", err))?;
        // Wake-up is measured from the end of the settle period.
        let until = SystemTime::now() + settle + sleep_for;
        link.update_and_hibernate(&bitmap, args.device, until, settle)
            .await
            .map_err(|err| link_error("update failed", err))
    })?;

    print_record(&Record::transmission(&args.port, &report.image), format);
    print_record(
        &Record::hibernation(&args.port, args.device, &report.hibernation),
        format,
    );
    Ok(SUCCESS)
}
