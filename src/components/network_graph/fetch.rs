use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

/// GETs `url` from the page's origin and returns the response body.
pub async fn fetch_text(url: &str) -> Result<String, String> {
	let opts = RequestInit::new();
	opts.set_method("GET");
	opts.set_mode(RequestMode::SameOrigin);

	let request = Request::new_with_str_and_init(url, &opts)
		.map_err(|e| format!("request error: {:?}", e))?;

	let window = web_sys::window().ok_or("no window")?;
	let resp_value = JsFuture::from(window.fetch_with_request(&request))
		.await
		.map_err(|e| format!("fetch error: {:?}", e))?;

	let resp: Response = resp_value
		.dyn_into()
		.map_err(|_| "response is not a Response")?;

	if !resp.ok() {
		return Err(format!("HTTP {}", resp.status()));
	}

	let body = JsFuture::from(resp.text().map_err(|e| format!("body error: {:?}", e))?)
		.await
		.map_err(|e| format!("body error: {:?}", e))?;
	body.as_string()
		.ok_or_else(|| "response body is not text".to_owned())
}
