#![allow(dead_code)]

use campus_shared::capabilities::{
    HttpMethod, HttpOperation, HttpResponse, HttpResult, KvOperation, KvOutput, KvResult,
};
use campus_shared::{App, Effect, Event, Model};
use crux_core::testing::{AppTester, Update};
use crux_core::Request;
use serde_json::Value;

/// Drives the app and collects the shell requests it leaves outstanding.
pub struct Harness {
    pub app: AppTester<App, Effect>,
    pub model: Model,
}

/// Shell requests produced by one step, after follow-up events have run.
#[derive(Default)]
pub struct Pending {
    pub api: Vec<Request<HttpOperation>>,
    pub store: Vec<Request<KvOperation>>,
    pub renders: usize,
}

impl Pending {
    pub fn take_api(&mut self, method: HttpMethod, path: &str) -> Request<HttpOperation> {
        let index = self
            .api
            .iter()
            .position(|r| {
                let request = r.operation.request();
                request.method() == method && request.url().path_and_query() == path
            })
            .unwrap_or_else(|| panic!("no {method} {path} in {:?}", self.api_paths()));
        self.api.remove(index)
    }

    pub fn api_paths(&self) -> Vec<String> {
        self.api
            .iter()
            .map(|r| {
                let request = r.operation.request();
                format!("{} {}", request.method(), request.url().path_and_query())
            })
            .collect()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self {
            app: AppTester::default(),
            model: Model::default(),
        }
    }

    pub fn send(&mut self, event: Event) -> Pending {
        let update = self.app.update(event, &mut self.model);
        self.drain(update)
    }

    pub fn respond(&mut self, request: &mut Request<HttpOperation>, result: HttpResult) -> Pending {
        let update = self
            .app
            .resolve(request, result)
            .expect("resolve http request");
        self.drain(update)
    }

    pub fn respond_json(
        &mut self,
        request: &mut Request<HttpOperation>,
        status: u16,
        body: Value,
    ) -> Pending {
        let bytes = serde_json::to_vec(&body).expect("json body");
        self.respond(request, Ok(HttpResponse::with_status(status, bytes)))
    }

    pub fn respond_store(&mut self, request: &mut Request<KvOperation>, result: KvResult) -> Pending {
        let update = self
            .app
            .resolve(request, result)
            .expect("resolve store request");
        self.drain(update)
    }

    /// Starts the app with no stored session.
    pub fn start_signed_out(&mut self) {
        let mut pending = self.send(Event::AppStarted);
        let mut load = pending.store.remove(0);
        self.respond_store(&mut load, Ok(KvOutput::Multi(vec![None, None])));
    }

    /// Hydrates a session for `profile` and returns what the first tab asked for.
    pub fn start_signed_in(&mut self, profile: Value) -> Pending {
        let mut pending = self.send(Event::AppStarted);
        let mut load = pending.store.remove(0);
        let mut pending = self.respond_store(
            &mut load,
            Ok(KvOutput::Multi(vec![Some(b"a1".to_vec()), Some(b"r1".to_vec())])),
        );
        let mut profile_request = pending.take_api(HttpMethod::Get, "/api/users/profile");
        self.respond_json(&mut profile_request, 200, profile)
    }

    pub fn view(&self) -> campus_shared::ViewModel {
        self.app.view(&self.model)
    }

    fn drain(&mut self, update: Update<Effect, Event>) -> Pending {
        let mut pending = Pending::default();
        self.collect(update, &mut pending);
        pending
    }

    fn collect(&mut self, update: Update<Effect, Event>, pending: &mut Pending) {
        for effect in update.effects {
            match effect {
                Effect::Render(_) => pending.renders += 1,
                Effect::Api(request) => pending.api.push(request),
                Effect::SessionStore(request) => pending.store.push(request),
            }
        }
        for event in update.events {
            let update = self.app.update(event, &mut self.model);
            self.collect(update, pending);
        }
    }
}

pub fn user_json(id: i64, name: &str, roles: &str) -> Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "mobileNumber": format!("90000000{id:02}"),
        "email": format!("{}@campus.example.edu", name.to_lowercase()),
        "roles": roles,
    })
}

pub fn complaint_json(id: i64, status: &str) -> Value {
    serde_json::json!({
        "id": id,
        "title": format!("Issue {id}"),
        "description": "Tap leaking in the corridor",
        "status": status,
        "createdAt": "2024-03-05T10:15:00",
        "user": { "name": "Asha" },
        "block": { "blockName": "Block A" },
        "floor": { "floorNo": 2 },
        "room": { "roomNo": "204" },
    })
}
