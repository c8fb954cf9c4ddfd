/// The address of a `From` style header value: whatever sits inside the
/// last pair of angle brackets, or the whole value if there are none.
///
/// ```
/// use mbox_attachments::address::angle_address;
///
/// assert_eq!(angle_address("\"Joe Blogs\" <joe@example.org>"), "joe@example.org");
/// assert_eq!(angle_address("joe@example.org"), "joe@example.org");
/// ```
///
/// No attempt is made to validate what is found, so display names that
/// are not followed by an address come back as they are.
pub fn angle_address(value: &str) -> &str {
    let after_open = match value.rfind('<') {
        Some(i) => &value[i + 1..],
        None => value,
    };
    match after_open.find('>') {
        Some(i) => &after_open[..i],
        None => after_open,
    }
}
