use inklink_link::{connect_with_config, LinkConfig};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::cmd::{runtime, LinkOptions, MonitorArgs};
use crate::exit::{io_error, link_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat, Record};

pub fn run(args: MonitorArgs, options: &LinkOptions, format: OutputFormat) -> CliResult<i32> {
    let config = LinkConfig {
        extra_signals: args.signals.clone(),
        ..options.config()?
    };

    runtime()?.block_on(async {
        let link = connect_with_config(&args.port, options.baud, config)
            .map_err(|err| link_error("connect failed", err))?;
        let mut lines = link.subscribe_lines();
        let mut printed = 0usize;

        loop {
            if args.count.is_some_and(|count| printed >= count) {
                return Ok(SUCCESS);
            }

            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal.map_err(|err| io_error("signal handler setup failed", err))?;
                    info!("interrupted");
                    return Ok(SUCCESS);
                }
                line = lines.recv() => match line {
                    Ok(line) => {
                        print_record(&Record::device_line(&args.port, &line), format);
                        printed = printed.saturating_add(1);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "output fell behind; dropped device lines");
                    }
                    Err(RecvError::Closed) => {
                        return match link.join_dispatcher().await {
                            Ok(()) => Ok(SUCCESS),
                            Err(err) => Err(link_error("monitor stopped", err)),
                        };
                    }
                },
            }
        }
    })
}
