//! End-to-end conversion tests: raw blog HTML in, FB2 fragment text out.
//!
//! Coverage:
//! - browser-style whitespace collapsing around inline boundaries
//! - the fixed rule set, both explicit tags and CSS-driven matches
//! - coalescing of adjacent runs and elimination of empty nodes
//! - `<br>` runs: a single one becomes a space, a double one splits the
//!   paragraph while keeping the open inline chain
//! - tables, including the transparency of `p` inside a cell

use blogspot2fb2::convert_html;

fn convert(html: &str) -> String {
    convert_html(html)
        .expect("in-memory conversion must not fail")
        .to_xml()
}

#[test]
fn test_plain_text_and_block_tags() {
    assert_eq!(convert("hello world"), "<p>hello world</p>");
    assert_eq!(
        convert("<p>Hi</p><div>xis</div><p>Meeh</p>"),
        "<p>Hi</p>\n<p>xis</p>\n<p>Meeh</p>",
        "div must open a paragraph like p does"
    );
    // Leading loose text keeps its trailing space: no closing tag event
    // ever trims that first paragraph.
    assert_eq!(
        convert("Masta <p>Get</p> Out!"),
        "<p>Masta </p>\n<p>Get</p>\n<p>Out!</p>"
    );
}

#[test]
fn test_unknown_tags_are_transparent() {
    assert_eq!(convert("Masta <span>Get</span> Out!"), "<p>Masta Get Out!</p>");
    // The two text events around the image both keep their edge space.
    assert_eq!(convert("Masta <img /> Out!"), "<p>Masta  Out!</p>");
    assert_eq!(
        convert("<a href=\"http://example.com/\">linked</a>"),
        "<p>linked</p>",
        "Anchors contribute only their text"
    );
}

#[test]
fn test_strong_from_tags_and_styles() {
    assert_eq!(
        convert("Masta <b>GGG</b> Out!"),
        "<p>Masta <strong>GGG</strong> Out!</p>"
    );
    assert_eq!(
        convert("Masta <span style=\"font-weight: bold\">GGG</span> Out!"),
        "<p>Masta <strong>GGG</strong> Out!</p>"
    );
    assert_eq!(
        convert("Masta <span style=\"font-weight: normal\">GGG</span> Out!"),
        "<p>Masta GGG Out!</p>",
        "A normal-weight span opens nothing"
    );
    assert_eq!(
        convert("Masta <b>G</b>G<b>G</b> Out!"),
        "<p>Masta <strong>G</strong>G<strong>G</strong> Out!</p>",
        "Text between runs keeps the runs separate"
    );
}

#[test]
fn test_style_driven_rules() {
    assert_eq!(
        convert("<span style=\"font-weight: 600\">x</span>"),
        "<p><strong>x</strong></p>",
        "Numeric weights from 500 up count as bold"
    );
    assert_eq!(
        convert("<b style=\"font-weight: lighter\">x</b>"),
        "<p>x</p>",
        "An explicitly lighter b tag opens nothing"
    );
    assert_eq!(
        convert("<i style=\"font-style: normal\">x</i>"),
        "<p>x</p>",
        "An explicitly normal i tag opens nothing"
    );
    assert_eq!(
        convert("<span style=\"font-style: strikethrough\">x</span>"),
        "<p><strikethrough>x</strikethrough></p>"
    );
    assert_eq!(
        convert("<span style=\"text-decoration: line-through\">x</span>"),
        "<p>x</p>",
        "A line-through decoration alone opens nothing"
    );
}

#[test]
fn test_nested_and_repeated_styles() {
    assert_eq!(
        convert("Masta <b><i>GGG</i></b> Out!"),
        "<p>Masta <strong><emphasis>GGG</emphasis></strong> Out!</p>"
    );
    assert_eq!(
        convert("Masta <i><b><i>GGG</i></b></i> Out!"),
        "<p>Masta <emphasis><strong>GGG</strong></emphasis> Out!</p>",
        "An already-open style must not nest again"
    );
    assert_eq!(
        convert("Masta <b><b>GGG</b></b> Out!"),
        "<p>Masta <strong>GGG</strong> Out!</p>"
    );
}

#[test]
fn test_simple_inline_tags() {
    assert_eq!(convert("<sup>a</sup>"), "<p><sup>a</sup></p>");
    assert_eq!(convert("<sub>a</sub>"), "<p><sub>a</sub></p>");
    assert_eq!(convert("<kbd>a</kbd>"), "<p><code>a</code></p>");
    assert_eq!(convert("<code>a</code>"), "<p><code>a</code></p>");
    assert_eq!(convert("<s>a</s>"), "<p><strikethrough>a</strikethrough></p>");
    assert_eq!(convert("<del>a</del>"), "<p><strikethrough>a</strikethrough></p>");
}

#[test]
fn test_edge_whitespace_moves_across_boundaries() {
    assert_eq!(convert("<p><b> ololo </b></p>"), "<p><strong>ololo</strong></p>");
    assert_eq!(
        convert("<p><b>mama roma </b><b> pizza time</b></p>"),
        "<p><strong>mama roma</strong> <strong>pizza time</strong></p>"
    );
    assert_eq!(
        convert("<p><b>mama roma </b><b>pizza time</b></p>"),
        "<p><strong>mama roma</strong> <strong>pizza time</strong></p>",
        "The space moved out of the first run still separates the two"
    );
    assert_eq!(
        convert("<p><b>3<i> aa</i></b></p>"),
        "<p><strong>3 <emphasis>aa</emphasis></strong></p>"
    );
    assert_eq!(
        convert("<p><b>3<i> aa </i>3</b></p>"),
        "<p><strong>3 <emphasis>aa</emphasis> 3</strong></p>"
    );
}

#[test]
fn test_edge_whitespace_in_deep_nesting() {
    assert_eq!(
        convert("<p>django<b><i> oooo </i>cute </b>power!</p>"),
        "<p>django <strong><emphasis>oooo</emphasis> cute</strong> power!</p>"
    );
    assert_eq!(
        convert("<p>django<b><i> oooo </i>cute</b>power!</p>"),
        "<p>django <strong><emphasis>oooo</emphasis> cute</strong>power!</p>",
        "No trailing space inside the run means none after it either"
    );
    assert_eq!(
        convert("<p>django<b><i> oooo </i><s>cute </s></b>power!<b>beatch</b></p>"),
        "<p>django <strong><emphasis>oooo</emphasis> \
         <strikethrough>cute</strikethrough></strong> power!<strong>beatch</strong></p>"
    );
    assert_eq!(
        convert("<p>django<b><i> oooo </i><s>cute </s></b>power!</p>"),
        "<p>django <strong><emphasis>oooo</emphasis> \
         <strikethrough>cute</strikethrough></strong> power!</p>"
    );
    assert_eq!(
        convert("<p>django<b><i> oooo </i></b>power!</p>"),
        "<p>django <strong><emphasis>oooo</emphasis></strong> power!</p>"
    );
}

#[test]
fn test_empty_content_is_dropped() {
    assert_eq!(convert(""), "");
    assert_eq!(convert(" "), "");
    assert_eq!(convert("<p> </p>"), "");
    assert_eq!(convert("<p><br/></p>"), "");
    assert_eq!(convert("<p></p><p>2</p><p></p>"), "<p>2</p>");
    assert_eq!(convert("<table><tr><td></td></tr></table>"), "");
}

#[test]
fn test_empty_runs_collapse_and_adjacent_runs_coalesce() {
    assert_eq!(convert("<b></b> <b>33</b> <b></b>"), "<p><strong>33</strong></p>");
    assert_eq!(
        convert("<b>3</b> <b>3</b> <b></b>"),
        "<p><strong>3</strong> <strong>3</strong></p>"
    );
    assert_eq!(
        convert("<b></b> <b>3</b> <b>3</b>"),
        "<p><strong>3</strong> <strong>3</strong></p>"
    );
    assert_eq!(convert("<b></b><b>33</b><b></b>"), "<p><strong>33</strong></p>");
    assert_eq!(convert("<b>33 </b><b></b>"), "<p><strong>33</strong></p>");
    assert_eq!(convert("<b>33</b><b> </b>"), "<p><strong>33</strong></p>");
    assert_eq!(
        convert("<b>3</b><b>3</b><b></b>"),
        "<p><strong>33</strong></p>",
        "Directly adjacent runs merge into one"
    );
    assert_eq!(convert("<b></b><b>3</b><b>3</b>"), "<p><strong>33</strong></p>");
    assert_eq!(convert("<p><b></b></p>33"), "<p>33</p>");
    assert_eq!(convert("<p>33 </p><p> 33</p>"), "<p>33</p>\n<p>33</p>");
}

#[test]
fn test_empty_run_soup_collapses() {
    assert_eq!(
        convert(
            "<p><b></b><b> </b><b></b><b>33</b><b></b><b> </b><br />\
             <b></b><b> </b><b> </b><b>33</b><b></b><b></b><b>33</b> \
             <b>33</b> <b></b> </p>"
        ),
        "<p><strong>33</strong> <strong>3333</strong> <strong>33</strong></p>"
    );
}

#[test]
fn test_single_break_becomes_a_space() {
    assert_eq!(convert("<p><b>3<br/>3</b></p>"), "<p><strong>3 3</strong></p>");
    assert_eq!(convert("Masta<br/>xx<br/>Out!"), "<p>Masta xx Out!</p>");
    assert_eq!(
        convert("<p><b><br/>33</b></p>"),
        "<p><strong>33</strong></p>",
        "A break before any text leaves no leading space"
    );
    assert_eq!(convert("<p><br/><b>33</b></p>"), "<p><strong>33</strong></p>");
    assert_eq!(
        convert("<p><b><br/><i>33</i></b></p>"),
        "<p><strong><emphasis>33</emphasis></strong></p>"
    );
}

#[test]
fn test_double_break_splits_the_paragraph() {
    assert_eq!(convert("Masta<br/><br/>Out!"), "<p>Masta</p>\n<p>Out!</p>");
    assert_eq!(convert("<p><b>12</b><b><br /><br /></b></p>"), "<p><strong>12</strong></p>");
    assert_eq!(
        convert("<p><b>12</b><b><br /></b><br /><br /></p>"),
        "<p><strong>12</strong></p>",
        "A split with nothing after it leaves no empty paragraph behind"
    );
    assert_eq!(
        convert("<p><b>12</b><b>2<br /><br /></b></p>"),
        "<p><strong>122</strong></p>"
    );
    assert_eq!(
        convert("<p><b>12</b><b>2<br /><br />2</b></p>"),
        "<p><strong>122</strong></p>\n<p><strong>2</strong></p>"
    );
    assert_eq!(
        convert("<p><b>12</b><b><br /><br />2</b></p>"),
        "<p><strong>12</strong></p>\n<p><strong>2</strong></p>"
    );
}

#[test]
fn test_double_break_carries_the_open_nesting() {
    assert_eq!(
        convert("<p>Mama<i>Pizza<b>TTT<br/><br/>Me</b>To</i></p>"),
        "<p>Mama<emphasis>Pizza<strong>TTT</strong></emphasis></p>\n\
         <p><emphasis><strong>Me</strong>To</emphasis></p>"
    );
    assert_eq!(
        convert("<p>Mama<i>Pizza<b>TTT<br/><br/></b>To</i></p>"),
        "<p>Mama<emphasis>Pizza<strong>TTT</strong></emphasis></p>\n\
         <p><emphasis>To</emphasis></p>",
        "The cloned strong stays empty and must disappear"
    );
}

#[test]
fn test_tables_keep_their_structure() {
    assert_eq!(
        convert("<p>33</p><table><tr><td> 33</td></tr></table>"),
        "<p>33</p>\n<table><tr><td>33</td></tr></table>"
    );
    assert_eq!(
        convert("<p>33</p><table><tr><td> 33</td><td> 33 </td><td>33 </td><td> 33</td></tr></table>"),
        "<p>33</p>\n<table><tr><td>33</td><td>33</td><td>33</td><td>33</td></tr></table>",
        "Cell edge whitespace dies at the cell boundary"
    );
    assert_eq!(
        convert("<p>33</p><table><tr><td><br/>33</td></tr></table>"),
        "<p>33</p>\n<table><tr><td>33</td></tr></table>"
    );
    assert_eq!(
        convert(
            "My table:<table><tr><th>A</th><th>B</th></tr>\
             <tr><td>1</td><td>2</td></tr>\
             <tr><td><b>3</b></td><td><i>4</i></td></tr></table>Done!"
        ),
        "<p>My table:</p>\n\
         <table><tr><th>A</th><th>B</th></tr>\
         <tr><td>1</td><td>2</td></tr>\
         <tr><td><strong>3</strong></td><td><emphasis>4</emphasis></td></tr></table>\n\
         <p>Done!</p>"
    );
}

#[test]
fn test_paragraph_machinery_is_disabled_inside_tables() {
    assert_eq!(
        convert("<p><table><tr><td>1</td></tr></table></p>"),
        "<table><tr><td>1</td></tr></table>"
    );
    assert_eq!(
        convert("<table><tr><td><p>1</p></td></tr></table></p>"),
        "<table><tr><td>1</td></tr></table>",
        "p inside a cell opens no paragraph"
    );
    assert_eq!(
        convert("<table><tr><td><p><b>1</b></p><em>2</em></td></tr></table></p>"),
        "<table><tr><td><strong>1</strong><emphasis>2</emphasis></td></tr></table>"
    );
    assert_eq!(
        convert("<table><tr><td>aa<em>cc</em>bb</td></tr></table>"),
        "<table><tr><td>aa<emphasis>cc</emphasis>bb</td></tr></table>"
    );
}

#[test]
fn test_breaks_inside_tables_never_split() {
    assert_eq!(
        convert("<table><tr><td>x<br/>y</td></tr></table>"),
        "<table><tr><td>x y</td></tr></table>"
    );
    assert_eq!(
        convert("<table><tr><td>x<br/><br/>y</td></tr></table>"),
        "<table><tr><td>x y</td></tr></table>",
        "Even a double break only yields a space inside a table"
    );
}

#[test]
fn test_real_post_markup_noise() {
    // Trimmed-down markup of an actual blog post: linked image, break
    // runs, an empty named anchor and nested spans around the one real
    // sentence.
    assert_eq!(
        convert(
            "<div><a href=\"http://www.amazon.de\">\
             <img border=\"0\" src=\"https://images-na.ssl-images-amazon.com\" /></a>\
             <br /><b>AAA</b><br /><b><br /></b><br /><br />\
             <a name=\"more\"></a><br /></div></div><br />\
             <div></div><div><span><span lang=\"EN-US\">A Dance with Dragons Review</span></span></div>"
        ),
        "<p><strong>AAA</strong></p>\n<p>A Dance with Dragons Review</p>"
    );
}
