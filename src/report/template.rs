//! Built-in report request template
//!
//! The instruction text handed to the summarizer. Bump
//! `REPORT_TEMPLATE_VERSION` whenever the wording changes so reports can be
//! traced back to the contract that produced them.
//!
//! Slots: `server_name`, `server_label`, `server_description`, `timestamp`,
//! `service_container`, `max_lines`, `prose_language`, `technical_language`,
//! and `sections` (each with `title` and `content`).

pub const REPORT_TEMPLATE_VERSION: &str = "2";

pub const REPORT_TEMPLATE: &str = r#"You are monitoring server '{{server_name}}' ({{server_description}}).
Report time: {{timestamp}} UTC

Write a terse server status report. Output plain Telegram HTML only.
Style: Teenage Engineering — minimal, technical, no fluff, no emoji, no box-drawing chars.

RULES:
- Section headers: <b>CAPS</b>
- Values: <code>value</code>
- Warnings/errors: <b>!!</b> prefix
- NO separator lines (no ─── or --- or ===)
- NO emoji at all
- Blank line between sections
- Lowercase labels, CAPS for status values: OK / WARN / CRIT
- Max {{max_lines}} lines. Cut anything that is normal/expected.
- Language: {{prose_language}} for descriptions, {{technical_language}} for technical terms

EXACT FORMAT:

<b>{{server_label}}</b>  {DD MON YYYY}  <code>{HH:MM} UTC</code>

<b>STATUS</b>  OK

<b>CONTAINERS</b>
{{service_container}}  <code>up 22m</code>  cpu <code>0.07%</code>  ram <code>359mb</code>

<b>RESOURCES</b>
cpu <code>0.07%</code>  load <code>0.14 0.15 0.12</code>
mem <code>1.5/3.7G</code> <code>40%</code>  disk <code>13/38G</code> <code>35%</code>
uptime <code>3d 5h</code>

<b>NETWORK</b>
estab <code>5</code>  syn_recv <code>1</code>  time_wait <code>3</code>
ssh fails <code>201/h</code>
fail2ban <code>3</code> banned
active sessions: <code>79.152.30.156</code> ssh x2  <code>176.120.22.47</code> ssh x1

<b>EVENTS</b>
<code>16:09</code> {{service_container}} restart (sigterm) — ok

<b>!! {specific problem and what to do}</b>

OMIT any section where there is nothing notable.
OMIT the !! block entirely if STATUS is OK.
For NETWORK active sessions: identify type (ssh/api/etc) and group by IP.
For threats: exact numbers, no vague wording.
{{#each sections}}{{#unless @first}}
{{/unless}}=== {{this.title}} ===
{{this.content}}
{{/each}}"#;
