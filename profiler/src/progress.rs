use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use routeprof::{Observer, RouteId, RouteStatus};

pub fn bar(header: String) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr_with_hz(4));
    pb.set_prefix(header);
    pb.set_style(
        ProgressStyle::with_template("{prefix} {pos}/{len} {msg}\n[{wide_bar:.cyan/blue}]")
            .expect("incorrect progress bar format string")
            .progress_chars("#>-"),
    );
    pb
}

/// Advances a bar once per finished route.
pub struct RouteProgress(ProgressBar);

impl RouteProgress {
    pub fn new(header: &str) -> Self {
        Self(bar(header.to_string()))
    }

    pub fn finish(&self) {
        self.0.finish_with_message("done");
    }
}

impl Observer for RouteProgress {
    fn routes_selected(&self, ids: &[RouteId]) {
        self.0.set_length(ids.len() as u64);
    }

    fn route_finished(&self, id: RouteId, status: &RouteStatus) {
        if *status != RouteStatus::Profiled {
            self.0.println(format!("route {id}: {status}"));
        }
        self.0.set_message(format!("route {id}"));
        self.0.inc(1);
    }
}
