//! Portal markup fixtures and mock wiring shared by the integration tests.

#![allow(dead_code)]

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TAB_ACTION_PATH: &str = "/webapps/portal/execute/tabs/tabAction";
pub const COURSE_PATH: &str = "/webapps/blackboard/execute/launcher";
pub const LECTURES_PATH: &str = "/webapps/blackboard/content/listContent.jsp";
pub const SYLLABUS_PATH: &str = "/webapps/blackboard/content/syllabus.jsp";

/// Course-list envelope with two terms: Fall 2024 (one course) then Spring 2025.
pub fn course_list_envelope() -> String {
    let fragment = format!(
        r##"<div id="div_3_1">
<h3 class="termHeading-coursefakeclass" id="anonymous_element_8"><a id="termCourses__254_1" href="#">（Fall 2024）</a></h3>
<div id="_3_1termCourses__254_1"><ul class="portletList-img courseListing coursefakeclass">
  <li><a href="{COURSE_PATH}?type=Course&amp;id=_100_1&amp;url=" target="_top">CS101 Intro</a>
    <div class="courseDataBlock"><span class="dataBlockLabel">Announcement:</span> <a href="/webapps/blackboard/execute/announcement?course_id=_100_1">Lab 0 posted</a></div>
  </li>
</ul></div>
<h3 class="termHeading-coursefakeclass"><a id="termCourses__260_1" href="#">（Spring 2025）</a></h3>
<div id="_3_1termCourses__260_1"><ul class="portletList-img courseListing coursefakeclass">
  <li><a href="{COURSE_PATH}?type=Course&amp;id=_200_1&amp;url=" target="_top">PH110 Physics</a></li>
</ul></div>
</div>"##
    );
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><contents><![CDATA[{fragment}]]></contents>"
    )
}

/// Course entry page: one top-level link, then a "Course Content" category.
pub fn sidebar_html() -> String {
    format!(
        r#"<html><body><div id="courseMenuPalette">
<ul id="courseMenuPalette_contents">
  <li><a href="{SYLLABUS_PATH}?course_id=_100_1"><span>Syllabus</span></a></li>
  <li class="subhead"><h3><span>Course Content</span></h3></li>
  <li><a href="{LECTURES_PATH}?course_id=_100_1&amp;content_id=_5_1"><span>Lectures</span></a></li>
</ul></div></body></html>"#
    )
}

/// Lectures page: one section with a good and a broken attachment.
pub fn lectures_html() -> &'static str {
    r#"<html><body><ul id="content_listContainer">
<li class="clearfix liItem read">
  <div class="item clearfix"><h3><span>Week 1</span></h3></div>
  <div class="details">
    <div class="vtbegenerated"><p>Slides for the first lecture.</p></div>
    <ul class="attachments clearfix">
      <li><a href="/files/slides.pdf">slides.pdf</a></li>
      <li><a href="/files/broken.pdf">broken.pdf</a></li>
    </ul>
  </div>
</li>
</ul></body></html>"#
}

/// Syllabus page: a single item whose heading links to the file.
pub fn syllabus_html() -> &'static str {
    r#"<html><body><ul id="content_listContainer">
<li class="clearfix liItem">
  <div class="item clearfix"><h3><a href="/files/syllabus.pdf"><span>Course Syllabus</span></a></h3></div>
  <div class="details"><div class="vtbegenerated"><p>Grading policy and schedule.</p></div></div>
</li>
</ul></body></html>"#
}

/// Answers the session probe with 200 so no CAS handshake is attempted.
pub async fn mount_valid_session(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(TAB_ACTION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>portal</html>"))
        .mount(server)
        .await;
}

/// Serves the course-list envelope.
pub async fn mount_course_list(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TAB_ACTION_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/xml;charset=UTF-8")
                .set_body_string(course_list_envelope()),
        )
        .mount(server)
        .await;
}

/// Serves a fixed HTML page at `route`.
pub async fn mount_html(server: &MockServer, route: &str, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html;charset=UTF-8")
                .set_body_string(body.into()),
        )
        .mount(server)
        .await;
}
