use leptos::prelude::*;

use super::home::NetworkPage;
use crate::graph::LayoutConfig;

const COURSE_NETWORK: &str = "/network/api/course-network/";

/// Courses linked by shared students
#[component]
pub fn Courses() -> impl IntoView {
	view! {
		<NetworkPage
			title="Course Network"
			endpoint=COURSE_NETWORK
			config=LayoutConfig::homogeneous()
		/>
	}
}
