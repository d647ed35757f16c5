use rouille::{Request, Response};
use serde_json::json;
use std::{io, sync::Arc, thread, time::Duration};
use crate::{cfg::BusConfig,
            controller::IoBus,
            core::channel_manager::ChannelManager,
            error::BusError,
            trace::trace_helper::TraceHelper};

/// Workers kept free for /input and /output while every
/// permitted /messages long poll is parked.
pub const REQUEST_WORKERS: usize = 8;

/// Each long poll occupies a worker until it resolves, so
/// the pool holds one per permitted subscriber on top of
/// the request workers.
pub fn pool_size(cfg: &BusConfig) -> usize
{
    cfg.max_subscribers + REQUEST_WORKERS
}

pub fn launch(chm: &mut ChannelManager, bus: Arc<dyn IoBus>, cfg: &BusConfig) -> io::Result<thread::JoinHandle<()>>
{
    let tracer = TraceHelper::new("WWW/Api".to_string(), chm);
    let surface = WebSurface::new(tracer.clone(), bus, cfg);
    let address = cfg.http_address.clone();
    let workers = pool_size(cfg);

    thread::Builder::new()
        .name("Web".to_string())
        .spawn(move || {
            match rouille::Server::new(address.as_str(), move |request| surface.handle(request))
            {
                Ok(server) =>
                {
                    tracer.trace(format!("Listening on {} with {} workers", address, workers));
                    server.pool_size(workers).run();
                },
                Err(e) => tracer.error(format!("Cannot listen on {}: {}", address, e))
            }
        })
}

fn bits(values: &[bool]) -> Vec<u8>
{
    values.iter().map(|b| *b as u8).collect()
}

fn error_response(status: u16, message: String) -> Response
{
    Response::json(&json!({ "status": "error", "message": message })).with_status_code(status)
}

/// # WebSurface
/// HTTP access to the bus:
/// * GET /input      current input image
/// * POST /output    switch one output (form: address, value)
/// * GET /messages   long poll for the next input change
pub struct WebSurface
{
    tracer: TraceHelper,
    bus: Arc<dyn IoBus>,
    message_timeout: Duration,
    ui_dir: Option<String>
}

impl WebSurface
{
    pub fn new(tracer: TraceHelper, bus: Arc<dyn IoBus>, cfg: &BusConfig) -> Self
    {
        WebSurface
        {
            tracer,
            bus,
            message_timeout: cfg.message_timeout(),
            ui_dir: cfg.ui_dir.clone()
        }
    }

    pub fn handle(&self, request: &Request) -> Response
    {
        if let Some(dir) = &self.ui_dir
        {
            let response = rouille::match_assets(request, dir);
            if response.is_success()
            {
                return response;
            }
        }

        router!(request,
            (GET) (/) => {
                Response::text("railbus controller")
            },
            (GET) (/input) => {
                self.get_input()
            },
            (POST) (/output) => {
                self.post_output(request)
            },
            (GET) (/messages) => {
                self.get_messages()
            },
            _ => Response::empty_404()
        )
    }

    fn get_input(&self) -> Response
    {
        Response::json(&json!({
            "status": "ok",
            "count": self.bus.stats().passes,
            "inputs": bits(&self.bus.read_inputs_snapshot())
        }))
    }

    fn post_output(&self, request: &Request) -> Response
    {
        let fields = match rouille::input::post::raw_urlencoded_post_input(request)
        {
            Ok(f) => f,
            Err(e) => return error_response(400, format!("bad form data: {}", e))
        };
        let field = |name: &str| fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.trim().to_string());

        let index = match field("address").map(|a| a.parse::<usize>())
        {
            Some(Ok(i)) => i,
            _ => return error_response(400, "missing or malformed address".to_string())
        };
        let value = match field("value").as_deref()
        {
            None | Some("1") | Some("true") | Some("on") => true,
            Some("0") | Some("false") | Some("off") => false,
            Some(other) => return error_response(400, format!("malformed value {}", other))
        };

        self.tracer.trace(format!("Setting output {} to {}", index, value as u8));
        match self.bus.set_output(index, value)
        {
            Ok(()) => {},
            Err(e @ BusError::BusBusy { .. }) => return error_response(503, e.to_string()),
            Err(e) => return error_response(400, e.to_string())
        }

        if field("html").is_some()
        {
            return Response::redirect_303("/");
        }

        Response::json(&json!({
            "status": "ok",
            "address": index,
            "count": self.bus.stats().passes,
            "input": self.bus.legacy_input().map(|b| b as u8)
        }))
    }

    fn get_messages(&self) -> Response
    {
        let subscription = match self.bus.subscribe_once()
        {
            Ok(s) => s,
            Err(e) =>
            {
                self.tracer.warn(format!("Refused subscriber: {}", e));
                return error_response(503, e.to_string());
            }
        };

        match subscription.wait_timeout(self.message_timeout)
        {
            Some(note) => Response::json(&json!({
                "timestamp": note.timestamp.timestamp_millis(),
                "event": "input",
                "inputs": bits(&note.inputs)
            })),
            None => Response::empty_204()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::web::*;
    use crate::{controller::BusController,
                notifier::{ChangeNotifier, Subscription},
                poller::PollStats};
    use railbus_hal::sim::SimulatedBus;
    use std::io::Read;

    fn body(response: Response) -> serde_json::Value
    {
        let (mut reader, _) = response.data.into_reader_and_size();
        let mut s = String::new();
        reader.read_to_string(&mut s).unwrap();
        serde_json::from_str(&s).unwrap()
    }

    fn form(url: &str, data: &str) -> Request
    {
        Request::fake_http("POST", url,
                           vec![("Content-Type".to_string(), "application/x-www-form-urlencoded".to_string())],
                           data.as_bytes().to_vec())
    }

    fn make_surface(message_timeout_ms: u64) -> (WebSurface, Arc<BusController<SimulatedBus>>, SimulatedBus)
    {
        let mut chm = ChannelManager::new();
        let mut cfg = BusConfig::default();
        cfg.strobe_hold_us = 0;
        cfg.message_timeout_ms = message_timeout_ms;
        cfg.max_subscribers = 1;
        let sim = SimulatedBus::new(cfg.wiring.clone());
        let controller = Arc::new(BusController::new(sim.clone(), &cfg, &mut chm));
        let tracer = TraceHelper::new("WWW/Test".to_string(), &mut chm);
        (WebSurface::new(tracer, controller.clone(), &cfg), controller, sim)
    }

    struct BusyBus
    {
        notifier: ChangeNotifier
    }

    impl IoBus for BusyBus
    {
        fn read_inputs_snapshot(&self) -> Vec<bool> { vec![false; 44] }
        fn set_output(&self, _index: usize, _value: bool) -> Result<(), BusError>
        {
            Err(BusError::BusBusy { waited: Duration::from_millis(50) })
        }
        fn subscribe_once(&self) -> Result<Subscription, BusError> { self.notifier.subscribe_once() }
        fn stats(&self) -> PollStats { PollStats::default() }
        fn legacy_input(&self) -> Option<bool> { None }
    }

    #[test]
    fn get_input_returns_forty_four_bits()
    {
        let (s, c, sim) = make_surface(10);
        sim.set_byte(0, 0x01);
        c.scan_pass().unwrap();
        let response = s.handle(&Request::fake_http("GET", "/input", vec![], vec![]));
        assert_eq!(200, response.status_code);
        let json = body(response);
        assert_eq!("ok", json["status"]);
        assert_eq!(1, json["count"]);
        assert_eq!(44, json["inputs"].as_array().unwrap().len());
        assert_eq!(1, json["inputs"][0]);
    }

    #[test]
    fn post_output_switches_the_output()
    {
        let (s, c, sim) = make_surface(10);
        let response = s.handle(&form("/output", "address=11&value=1"));
        assert_eq!(200, response.status_code);
        assert_eq!(11, body(response)["address"]);
        assert_eq!(Some(true), c.state().output(11));
        assert_eq!(0b0000_1000, sim.byte(7));
    }

    #[test]
    fn post_output_rejects_index_past_the_end()
    {
        let (s, _, sim) = make_surface(10);
        let response = s.handle(&form("/output", "address=2000&value=1"));
        assert_eq!(400, response.status_code);
        assert!(sim.cycles().is_empty());
    }

    #[test]
    fn post_output_without_address_is_a_bad_request()
    {
        let (s, _, _) = make_surface(10);
        assert_eq!(400, s.handle(&form("/output", "value=1")).status_code);
        assert_eq!(400, s.handle(&form("/output", "address=3&value=maybe")).status_code);
    }

    #[test]
    fn busy_bus_maps_to_service_unavailable()
    {
        let bus = Arc::new(BusyBus { notifier: ChangeNotifier::new(1) });
        let mut chm = ChannelManager::new();
        let s = WebSurface::new(TraceHelper::new("WWW/Test".to_string(), &mut chm), bus, &BusConfig::default());
        assert_eq!(503, s.handle(&form("/output", "address=3")).status_code);
    }

    #[test]
    fn messages_times_out_with_no_content()
    {
        let (s, _, _) = make_surface(10);
        let response = s.handle(&Request::fake_http("GET", "/messages", vec![], vec![]));
        assert_eq!(204, response.status_code);
    }

    #[test]
    fn timed_out_subscriber_frees_its_slot()
    {
        let (s, _, _) = make_surface(10);
        assert_eq!(204, s.handle(&Request::fake_http("GET", "/messages", vec![], vec![])).status_code);
        assert_eq!(204, s.handle(&Request::fake_http("GET", "/messages", vec![], vec![])).status_code);
    }

    #[test]
    fn messages_refused_when_subscriber_limit_reached()
    {
        let bus = Arc::new(BusyBus { notifier: ChangeNotifier::new(1) });
        let _held = bus.notifier.subscribe_once().unwrap();
        let mut chm = ChannelManager::new();
        let s = WebSurface::new(TraceHelper::new("WWW/Test".to_string(), &mut chm), bus.clone(), &BusConfig::default());
        assert_eq!(503, s.handle(&Request::fake_http("GET", "/messages", vec![], vec![])).status_code);
    }

    #[test]
    fn messages_delivers_next_change()
    {
        let (s, c, sim) = make_surface(5000);
        let s = Arc::new(s);
        let s2 = s.clone();
        let t = thread::spawn(move || s2.handle(&Request::fake_http("GET", "/messages", vec![], vec![])));

        // keep toggling until the long poll has seen a change
        let mut high = false;
        for _ in 0..500
        {
            high = !high;
            sim.set_byte(1, if high { 0x04 } else { 0x00 });
            c.scan_pass().unwrap();
            if t.is_finished()
            {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }

        let response = t.join().unwrap();
        assert_eq!(200, response.status_code);
        let json = body(response);
        assert_eq!("input", json["event"]);
        assert_eq!(44, json["inputs"].as_array().unwrap().len());
    }

    #[test]
    fn parked_long_polls_leave_workers_for_requests()
    {
        let mut cfg = BusConfig::default();
        assert_eq!(cfg.max_subscribers + REQUEST_WORKERS, pool_size(&cfg));
        cfg.max_subscribers = 500;
        assert!(pool_size(&cfg) > cfg.max_subscribers);
    }

    #[test]
    fn output_is_served_while_long_polls_are_parked()
    {
        let (s, c, sim) = make_surface(5000);
        let s = Arc::new(s);
        let s2 = s.clone();
        let parked = thread::spawn(move || s2.handle(&Request::fake_http("GET", "/messages", vec![], vec![])));
        thread::sleep(Duration::from_millis(20));

        assert_eq!(200, s.handle(&form("/output", "address=0&value=1")).status_code);
        assert_eq!(0x01, sim.byte(6));
        assert_eq!(200, s.handle(&Request::fake_http("GET", "/input", vec![], vec![])).status_code);

        let mut high = false;
        while !parked.is_finished()
        {
            high = !high;
            sim.set_byte(0, high as u8);
            c.scan_pass().unwrap();
            thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(200, parked.join().unwrap().status_code);
    }

    #[test]
    fn unknown_route_is_404()
    {
        let (s, _, _) = make_surface(10);
        assert_eq!(404, s.handle(&Request::fake_http("GET", "/nope", vec![], vec![])).status_code);
    }
}
