/// Wall-clock reading taken once per request.
#[derive(Debug, Clone, PartialEq)]
pub struct Timestamp {
    pub millis: u64,
    pub iso: String,
}

impl Timestamp {
    /// Current time from the JS runtime. Only callable inside the worker.
    pub fn now() -> Self {
        let date = js_sys::Date::new_0();
        Self {
            millis: date.get_time() as u64,
            iso: date.to_iso_string().into(),
        }
    }
}

/// ISO-8601 time `hours` before `now`. Only callable inside the worker.
pub fn iso_hours_before(now: &Timestamp, hours: u32) -> String {
    let millis = now.millis.saturating_sub(u64::from(hours) * 3_600_000);
    js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(millis as f64))
        .to_iso_string()
        .into()
}
