// Embedded control page
//
// Single static page, no assets, no templating: the page polls
// /api/status on a 100ms cadence and drives the session through the GET
// endpoints. Served from the binary so the tool stays a single file.

use axum::response::Html;

/// GET / - the control page
pub async fn index() -> Html<&'static str> {
    Html(PAGE)
}

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>scrolltape</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
            background: #fafaf8;
            color: #134252;
            margin: 0;
            padding: 20px;
        }
        .card {
            max-width: 640px;
            margin: 0 auto;
            background: #fff;
            border-radius: 12px;
            border: 1px solid #e8e8e6;
            padding: 24px;
            box-shadow: 0 1px 3px rgba(0,0,0,0.05);
        }
        h1 { margin-top: 0; }
        .subtitle { color: #627C71; font-size: 14px; margin-bottom: 16px; }
        .distance { font-size: 32px; font-weight: 700; color: #2B8080; margin: 12px 0; }
        .sub { font-size: 13px; color: #627C71; }
        button {
            padding: 10px 18px;
            border-radius: 8px;
            border: none;
            cursor: pointer;
            font-weight: 600;
            margin-right: 8px;
            margin-top: 8px;
        }
        .primary { background: #218D8D; color: white; }
        .secondary { background: #f5f5f5; color: #134252; }
        .row { margin-top: 12px; }
        .tag {
            display: inline-block;
            padding: 4px 10px;
            border-radius: 999px;
            font-size: 11px;
            font-weight: 600;
            background: rgba(33,141,141,0.08);
            color: #218D8D;
            margin-bottom: 8px;
        }
    </style>
</head>
<body>
<div class="card">
    <h1>scrolltape</h1>
    <p class="subtitle">Calibrate with 30 cm, then measure in real time.</p>

    <div id="status-tag" class="tag">Idle</div>

    <div class="distance" id="distance-main">0.00 cm</div>
    <div class="sub" id="distance-extra">0.0 mm &middot; 0.000 m &middot; 0.00 in</div>
    <div class="sub" id="clicks-label">Clicks: 0</div>
    <div class="sub" id="calib-label">Not calibrated</div>

    <div class="row">
        <strong>Calibration (30 cm):</strong><br>
        <button class="primary" id="btn-calib-start">Start Calibration</button>
        <button class="secondary" id="btn-calib-finish">Finish Calibration</button>
    </div>

    <div class="row">
        <strong>Measurement:</strong><br>
        <button class="primary" id="btn-meas-start">Start Measuring</button>
        <button class="secondary" id="btn-meas-stop">Stop Measuring</button>
        <button class="secondary" id="btn-reset">Reset Distance</button>
    </div>

    <p class="sub" style="margin-top:16px;">
        Calibration: mark 30 cm with a ruler, click <strong>Start Calibration</strong>,
        roll the scroll wheel exactly from 0 to 30 cm, then click
        <strong>Finish Calibration</strong>.
    </p>
    <p class="sub">
        Measurement: click <strong>Start Measuring</strong>, roll the wheel over what
        you want to measure, then click <strong>Stop Measuring</strong>.
    </p>
</div>

<script>
    async function callApi(path) {
        const res = await fetch(path);
        return await res.json();
    }

    function setStatus(text) {
        document.getElementById("status-tag").textContent = text;
    }

    async function updateStatus() {
        const data = await callApi("/api/status");
        document.getElementById("distance-main").textContent =
            data.distance_cm.toFixed(2) + " cm";
        document.getElementById("distance-extra").textContent =
            data.distance_mm.toFixed(1) + " mm · " +
            data.distance_m.toFixed(3) + " m · " +
            data.distance_in.toFixed(2) + " in";
        document.getElementById("clicks-label").textContent =
            "Clicks: " + data.clicks;

        if (data.calibrated) {
            document.getElementById("calib-label").textContent =
                "Calibrated: " + data.clicks_per_cm.toFixed(2) + " clicks/cm";
        } else {
            document.getElementById("calib-label").textContent = "Not calibrated";
        }
        setStatus("Mode: " + data.mode);
    }

    document.getElementById("btn-calib-start").onclick = async () => {
        await callApi("/api/start_calibration");
        setStatus("Calibrating... Roll 30 cm");
    };

    document.getElementById("btn-calib-finish").onclick = async () => {
        const res = await fetch("/api/finish_calibration");
        if (!res.ok) {
            alert("Calibration failed (no scroll?). Try again.");
        } else {
            const data = await res.json();
            alert(
                "Calibration done!\nClicks: " + data.clicks +
                "\nClicks/cm: " + data.clicks_per_cm.toFixed(2) +
                "\ncm/click: " + data.cm_per_click.toFixed(4)
            );
        }
        await updateStatus();
    };

    document.getElementById("btn-meas-start").onclick = async () => {
        const res = await fetch("/api/start_measure");
        if (!res.ok) {
            const data = await res.json();
            alert("Error: " + (data.msg || "Not calibrated"));
            return;
        }
        setStatus("Measuring... Roll wheel");
    };

    document.getElementById("btn-meas-stop").onclick = async () => {
        await callApi("/api/stop_measure");
        setStatus("Idle");
        await updateStatus();
    };

    document.getElementById("btn-reset").onclick = async () => {
        await callApi("/api/reset");
        await updateStatus();
    };

    setInterval(updateStatus, 100);
    updateStatus();
</script>
</body>
</html>
"#;
