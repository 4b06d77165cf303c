use inklink_link::connect_with_config;

use crate::cmd::{runtime, ImageArgs, LinkOptions};
use crate::exit::{link_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat, Record};
use crate::pnm::load_bitmap;

pub fn run(args: ImageArgs, options: &LinkOptions, format: OutputFormat) -> CliResult<i32> {
    let bitmap = load_bitmap(&args.file)?;
    let config = options.config()?;

    let report = runtime()?.block_on(async {
        let link = connect_with_config(&args.port, options.baud, config)
            .map_err(|err| link_error("connect failed", err))?;
        link.send_image(&bitmap, args.device)
            .await
            .map_err(|err| link_error("image send failed", err))
    })?;

    print_record(&Record::transmission(&args.port, &report), format);
    Ok(SUCCESS)
}
